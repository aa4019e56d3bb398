use super::record::IncomeRecord;
use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// A line that could not be turned into a record during an import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineError {
    pub line: u64,
    pub message: String,
    pub raw: String,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {} - {}", self.line, self.message, self.raw)
    }
}

/// Records decoded from a source, plus the lines that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub records: Vec<IncomeRecord>,
    pub errors: Vec<LineError>,
}

/// Where record batches are loaded from and saved to.
pub trait RecordStore: Send + Sync {
    /// Reads every decodable record; undecodable lines end up in `errors`.
    fn load(&self) -> Result<ImportOutcome>;
    /// Writes the batch, returning the number of records written.
    fn save(&self, records: &[IncomeRecord]) -> Result<usize>;
}

pub type RecordStoreBox = Box<dyn RecordStore>;
