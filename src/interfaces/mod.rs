//! Adapters between record batches and their textual representations.

pub mod cli;
pub mod csv;
pub mod snapshot;

use crate::domain::ports::{ImportOutcome, LineError};
use crate::domain::record::IncomeRecord;
use std::io::{self, BufRead, BufReader, Read};
use tracing::warn;

/// Physical lines of `source`, numbered from 1, blank lines included.
///
/// Line endings (`\n` or `\r\n`) are stripped and invalid UTF-8 is replaced
/// rather than rejected. A read error is yielded once and ends the stream.
pub(crate) fn numbered_lines<R: Read>(
    source: R,
) -> impl Iterator<Item = (u64, io::Result<String>)> {
    let mut failed = false;
    BufReader::new(source)
        .split(b'\n')
        .zip(1u64..)
        .map_while(move |(bytes, number)| {
            if failed {
                return None;
            }
            failed = bytes.is_err();
            let text = bytes.map(|bytes| {
                let mut text = String::from_utf8_lossy(&bytes).into_owned();
                if text.ends_with('\r') {
                    text.pop();
                }
                text
            });
            Some((number, text))
        })
}

/// Decodes every non-blank line with `decode`, turning failures into
/// `LineError`s. `skip_first` sees the first non-blank line and may drop it.
pub(crate) fn decode_lines<R, D, S>(
    source: R,
    decode: D,
    mut skip_first: S,
) -> impl Iterator<Item = Result<IncomeRecord, LineError>>
where
    R: Read,
    D: Fn(&str) -> crate::error::Result<IncomeRecord>,
    S: FnMut(&str) -> bool,
{
    let mut first_seen = false;
    numbered_lines(source).filter_map(move |(line, text)| {
        let text = match text {
            Ok(text) => text,
            Err(e) => {
                return Some(Err(LineError {
                    line,
                    message: e.to_string(),
                    raw: String::new(),
                }));
            }
        };
        if text.trim().is_empty() {
            return None;
        }
        if !first_seen {
            first_seen = true;
            if skip_first(&text) {
                return None;
            }
        }
        let decoded = decode(&text);
        Some(decoded.map_err(|e| LineError {
            line,
            message: e.to_string(),
            raw: text,
        }))
    })
}

/// Drains a per-line record stream, logging every skipped line.
pub(crate) fn collect_outcome(
    rows: impl Iterator<Item = Result<IncomeRecord, LineError>>,
) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();
    for row in rows {
        match row {
            Ok(record) => outcome.records.push(record),
            Err(error) => {
                warn!("Parse error: {error}");
                outcome.errors.push(error);
            }
        }
    }
    outcome
}
