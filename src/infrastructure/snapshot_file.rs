use super::csv_file::create_parent_dirs;
use crate::domain::ports::{ImportOutcome, RecordStore};
use crate::domain::record::IncomeRecord;
use crate::error::Result;
use crate::interfaces::snapshot::{SnapshotReader, SnapshotWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Record store backed by a pipe delimited snapshot file.
///
/// A snapshot that does not exist yet loads as an empty batch.
#[derive(Debug, Clone)]
pub struct SnapshotFileStore {
    path: PathBuf,
}

impl SnapshotFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for SnapshotFileStore {
    fn load(&self) -> Result<ImportOutcome> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "Data file not found");
            return Ok(ImportOutcome::default());
        }
        let file = File::open(&self.path)?;
        let outcome = SnapshotReader::new(file).import();
        info!(
            path = %self.path.display(),
            records = outcome.records.len(),
            "Loaded snapshot"
        );
        Ok(outcome)
    }

    fn save(&self, records: &[IncomeRecord]) -> Result<usize> {
        create_parent_dirs(&self.path)?;
        let file = File::create(&self.path)?;
        let written = SnapshotWriter::new(BufWriter::new(file)).write_records(records)?;
        info!(path = %self.path.display(), records = written, "Data saved");
        Ok(written)
    }
}
