//! Pipe delimited snapshot format: `CODE|DESCRIPTION|DATE|INCOME|WHT`.
//!
//! One record per line, no header and no checksum column. Snapshots carry
//! business fields only, so records loaded from one start unvalidated with a
//! zero source checksum.

use crate::domain::ports::{ImportOutcome, LineError};
use crate::domain::record::IncomeRecord;
use crate::error::{LedgerError, Result};
use crate::interfaces::{collect_outcome, decode_lines};
use std::io::{Read, Write};

pub struct SnapshotReader<R: Read> {
    source: R,
}

impl<R: Read> SnapshotReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    pub fn records(self) -> impl Iterator<Item = Result<IncomeRecord, LineError>> {
        decode_lines(self.source, IncomeRecord::from_data_line, |_| false)
    }

    pub fn import(self) -> ImportOutcome {
        collect_outcome(self.records())
    }
}

pub struct SnapshotWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SnapshotWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(b'|')
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_records(&mut self, records: &[IncomeRecord]) -> Result<usize> {
        for record in records {
            self.writer.write_record(record.data_fields())?;
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
