//! Record integrity checksum.
//!
//! The checksum of a record is computed over its canonical transaction line
//! `CODE,DESCRIPTION,DATE,INCOME,WHT` (amounts always rendered with two
//! decimals) and equals the number of ASCII uppercase letters plus the number
//! of ASCII digits and decimal points in that line. Separators and every other
//! character are ignored.

use super::money::fixed_2dp;
use super::record::IncomeRecord;
use serde::Serialize;

/// Per character class counts behind a checksum value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChecksumBreakdown {
    pub uppercase: usize,
    pub digits_and_points: usize,
}

impl ChecksumBreakdown {
    pub fn of(line: &str) -> Self {
        line.chars().fold(Self::default(), |mut acc, c| {
            if c.is_ascii_uppercase() {
                acc.uppercase += 1;
            } else if c.is_ascii_digit() || c == '.' {
                acc.digits_and_points += 1;
            }
            acc
        })
    }

    pub fn total(&self) -> i64 {
        (self.uppercase + self.digits_and_points) as i64
    }
}

pub fn checksum(line: &str) -> i64 {
    ChecksumBreakdown::of(line).total()
}

/// Canonical transaction line of a record, without its checksum.
pub fn canonical_line(record: &IncomeRecord) -> String {
    format!(
        "{},{},{},{},{}",
        record.code(),
        record.description(),
        record.date(),
        fixed_2dp(record.income_amount().value()),
        fixed_2dp(record.wht_amount().value()),
    )
}

pub fn record_checksum(record: &IncomeRecord) -> i64 {
    checksum(&canonical_line(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_known_checksum() {
        assert_eq!(
            checksum("IN001,Freelance Work,25/07/2025,10000.00,1000.00"),
            30
        );
    }

    #[test]
    fn test_breakdown_counts_each_class() {
        let breakdown = ChecksumBreakdown::of("IN001,Freelance Work,25/07/2025,10000.00,1000.00");
        assert_eq!(breakdown.uppercase, 4);
        assert_eq!(breakdown.digits_and_points, 26);
    }

    #[test]
    fn test_ignores_lowercase_separators_and_non_ascii() {
        assert_eq!(checksum("abc,/ -"), 0);
        assert_eq!(checksum("ÉÜ"), 0);
        assert_eq!(checksum("A.1"), 3);
        assert_eq!(checksum(""), 0);
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let line = "SA002,Consulting,26/07/2025,15000.00,1500.00";
        assert_eq!(checksum(line), checksum(line));
    }

    #[test]
    fn test_canonical_line_reformats_amounts() {
        let record = IncomeRecord::new("in001", "Freelance Work", "25/07/2025", dec!(10000), dec!(1000))
            .unwrap();
        assert_eq!(
            canonical_line(&record),
            "IN001,Freelance Work,25/07/2025,10000.00,1000.00"
        );
        assert_eq!(record_checksum(&record), 30);
    }
}
