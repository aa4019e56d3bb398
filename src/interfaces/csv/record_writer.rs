use crate::domain::record::IncomeRecord;
use crate::error::{LedgerError, Result};
use std::io::Write;

pub const CSV_HEADER: [&str; 6] = [
    "Income_Code",
    "Description",
    "Date",
    "Income_Amount",
    "WHT_Amount",
    "Checksum",
];

/// Writes income records as comma separated lines under a fixed header.
///
/// Fields are never quoted, mirroring how `RecordReader` splits lines.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink);
        Self { writer }
    }

    /// Writes the header and one line per record. An empty batch is refused.
    pub fn write_records(&mut self, records: &[IncomeRecord]) -> Result<usize> {
        if records.is_empty() {
            return Err(LedgerError::ArgumentError(
                "No records to export".to_string(),
            ));
        }
        self.writer.write_record(CSV_HEADER)?;
        for record in records {
            self.writer.write_record(record.csv_fields())?;
        }
        self.writer.flush()?;
        Ok(records.len())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| LedgerError::IoError(e.into_error()))
    }
}
