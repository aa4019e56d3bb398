use crate::domain::ports::{ImportOutcome, LineError};
use crate::domain::record::IncomeRecord;
use crate::interfaces::{collect_outcome, decode_lines};
use std::io::Read;

const HEADER_MARKERS: [&str; 3] = ["income_code", "description", "checksum"];

/// True when the line names one of the known column headings.
pub fn is_header_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADER_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Reads income records from a comma separated source.
///
/// Quoting is not supported: every comma is a separator. The first non-blank
/// line is skipped when it looks like a header; otherwise it is parsed as
/// data. Line numbers count physical lines, blank ones included.
pub struct RecordReader<R: Read> {
    source: R,
}

impl<R: Read> RecordReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Lazily decodes one record per data line.
    ///
    /// A line that fails to decode yields a `LineError` and iteration goes on.
    pub fn records(self) -> impl Iterator<Item = Result<IncomeRecord, LineError>> {
        decode_lines(self.source, IncomeRecord::from_csv_line, is_header_line)
    }

    pub fn import(self) -> ImportOutcome {
        collect_outcome(self.records())
    }
}
