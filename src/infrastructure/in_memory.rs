use crate::domain::ports::{ImportOutcome, RecordStore};
use crate::domain::record::IncomeRecord;
use crate::error::Result;
use std::sync::{Arc, PoisonError, RwLock};

/// A thread-safe in-memory record store.
///
/// Clones share the same underlying batch, so a clone handed to another
/// component observes every `save` made through the original.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<Vec<IncomeRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<IncomeRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load(&self) -> Result<ImportOutcome> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(ImportOutcome {
            records: records.clone(),
            errors: Vec::new(),
        })
    }

    fn save(&self, records: &[IncomeRecord]) -> Result<usize> {
        let mut stored = self.records.write().unwrap_or_else(PoisonError::into_inner);
        *stored = records.to_vec();
        Ok(stored.len())
    }
}
