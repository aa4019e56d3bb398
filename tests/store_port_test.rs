use rust_decimal_macros::dec;
use std::thread;
use whtax::domain::ports::{RecordStore, RecordStoreBox};
use whtax::domain::record::IncomeRecord;
use whtax::infrastructure::csv_file::CsvFileStore;
use whtax::infrastructure::in_memory::InMemoryRecordStore;
use whtax::infrastructure::snapshot_file::SnapshotFileStore;

fn sample() -> Vec<IncomeRecord> {
    vec![
        IncomeRecord::new("IN001", "Freelance Work", "25/07/2025", dec!(10000), dec!(1000))
            .unwrap()
            .with_original_checksum(30),
        IncomeRecord::new("SA002", "Consulting", "26/07/2025", dec!(15000), dec!(1500)).unwrap(),
    ]
}

#[test]
fn test_stores_as_trait_objects() {
    let dir = tempfile::tempdir().unwrap();
    let stores: Vec<RecordStoreBox> = vec![
        Box::new(InMemoryRecordStore::new()),
        Box::new(CsvFileStore::new(dir.path().join("records.csv"))),
        Box::new(SnapshotFileStore::new(dir.path().join("records.dat"))),
    ];

    // Send + Sync: every store is exercised from its own thread
    let handles: Vec<_> = stores
        .into_iter()
        .map(|store| {
            thread::spawn(move || {
                assert_eq!(store.save(&sample()).unwrap(), 2);
                store.load().unwrap()
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.join().unwrap();
        assert!(outcome.errors.is_empty());
        let codes: Vec<&str> = outcome.records.iter().map(|r| r.code()).collect();
        assert_eq!(codes, ["IN001", "SA002"]);
        assert_eq!(outcome.records[1].income_amount().value(), dec!(15000.00));
    }
}

#[test]
fn test_csv_store_carries_calculated_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvFileStore::new(dir.path().join("records.csv"));
    store.save(&sample()).unwrap();

    // nothing has been validated, so the calculated checksum written is 0
    let outcome = store.load().unwrap();
    assert!(outcome.records.iter().all(|r| r.original_checksum() == 0));
}

#[test]
fn test_in_memory_store_is_shared_between_clones() {
    let store = InMemoryRecordStore::new();
    let boxed: RecordStoreBox = Box::new(store.clone());

    boxed.save(&sample()).unwrap();
    assert_eq!(store.len(), 2);
}
