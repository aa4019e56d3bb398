use crate::domain::checksum::{ChecksumBreakdown, canonical_line, checksum, record_checksum};
use crate::domain::record::{
    IncomeRecord, is_valid_code, is_valid_date, is_valid_description, is_valid_income_amount,
    is_valid_wht_amount,
};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Incomes above this are flagged as a likely data entry error.
pub const VERY_HIGH_INCOME: Decimal = dec!(10000000);
/// Income dates older than this many years are flagged.
pub const STALE_DATE_YEARS: i32 = 10;

/// Advisory findings of the business-rule stage. They never affect validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessWarning {
    WhtExceedsIncome,
    VeryHighIncome,
    StaleDate,
}

impl fmt::Display for BusinessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            BusinessWarning::WhtExceedsIncome => "WHT amount exceeds income amount",
            BusinessWarning::VeryHighIncome => "Extremely high income amount detected",
            BusinessWarning::StaleDate => "Income date is more than 10 years old",
        };
        f.write_str(message)
    }
}

/// Messages for every field predicate the record fails.
pub fn format_errors(record: &IncomeRecord) -> Vec<&'static str> {
    let mut errors = Vec::new();
    if !is_valid_code(record.code()) {
        errors.push("Invalid income code format");
    }
    if !is_valid_description(record.description()) {
        errors.push("Invalid description");
    }
    if !is_valid_date(record.date()) {
        errors.push("Invalid date format");
    }
    if !is_valid_income_amount(record.income_amount().value()) {
        errors.push("Invalid income amount");
    }
    if !is_valid_wht_amount(record.wht_amount().value()) {
        errors.push("Invalid WHT amount");
    }
    errors
}

pub fn check_business_rules(record: &IncomeRecord) -> Vec<BusinessWarning> {
    check_business_rules_on(record, Local::now().date_naive())
}

/// Business rules evaluated against an explicit current date.
///
/// Staleness compares calendar years only: any date in a year before
/// `today.year() - 10` is stale.
pub fn check_business_rules_on(record: &IncomeRecord, today: NaiveDate) -> Vec<BusinessWarning> {
    let mut warnings = Vec::new();
    if record.wht_amount() > record.income_amount() {
        warnings.push(BusinessWarning::WhtExceedsIncome);
    }
    if record.income_amount().value() > VERY_HIGH_INCOME {
        warnings.push(BusinessWarning::VeryHighIncome);
    }
    if let Some(date) = record.calendar_date()
        && date.year() < today.year() - STALE_DATE_YEARS
    {
        warnings.push(BusinessWarning::StaleDate);
    }
    warnings
}

/// Outcome of a batch validation. `valid_count + invalid_count == total_count`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub total_count: usize,
    pub valid_records: Vec<IncomeRecord>,
    pub invalid_records: Vec<IncomeRecord>,
}

impl ValidationSummary {
    pub fn valid_count(&self) -> usize {
        self.valid_records.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_records.len()
    }

    pub fn success_rate(&self) -> f64 {
        rate(self.valid_count() as u64, self.total_count as u64)
    }
}

/// Snapshot of an engine's lifetime counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ValidationStatistics {
    pub total_validations: u64,
    pub successful_validations: u64,
    pub failed_validations: u64,
}

impl ValidationStatistics {
    pub fn success_rate(&self) -> f64 {
        rate(self.successful_validations, self.total_validations)
    }
}

impl fmt::Display for ValidationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValidationStats{{total={}, success={}, failed={}, rate={:.1}%}}",
            self.total_validations,
            self.successful_validations,
            self.failed_validations,
            self.success_rate()
        )
    }
}

fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Read-only diagnosis of a single record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub code: String,
    pub transaction_line: String,
    pub breakdown: ChecksumBreakdown,
    pub original_checksum: i64,
    pub calculated_checksum: i64,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<BusinessWarning>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation report for {}", self.code)?;
        writeln!(f, "  Transaction line: {}", self.transaction_line)?;
        writeln!(f, "  Capital letters: {}", self.breakdown.uppercase)?;
        writeln!(f, "  Digits and decimal points: {}", self.breakdown.digits_and_points)?;
        writeln!(f, "  Calculated checksum: {}", self.calculated_checksum)?;
        writeln!(f, "  Original checksum: {}", self.original_checksum)?;
        write!(f, "  Status: {}", if self.valid { "Valid" } else { "Invalid" })?;
        for warning in &self.warnings {
            write!(f, "\n  Warning: {warning}")?;
        }
        for error in &self.errors {
            write!(f, "\n  Error: {error}")?;
        }
        Ok(())
    }
}

/// One line of the checksum self-test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumCase {
    pub name: &'static str,
    pub input: &'static str,
    pub expected: Option<i64>,
    pub calculated: i64,
}

impl ChecksumCase {
    pub fn passed(&self) -> bool {
        self.expected.is_none_or(|expected| expected == self.calculated)
    }
}

const SELF_TEST_CASES: [(&str, &str, Option<i64>); 3] = [
    (
        "Basic Test",
        "IN001,Freelance Work,25/07/2025,10000.00,1000.00",
        Some(30),
    ),
    (
        "Variation Test",
        "SA002,Consulting,26/07/2025,15000.00,1500.00",
        None,
    ),
    ("Edge Case", "AB123,Test,01/01/2024,1.00,0.00", None),
];

/// Runs the three-stage record validation pipeline and keeps lifetime
/// counters.
///
/// Counters are atomics, so one engine can be shared across threads that
/// validate distinct records.
#[derive(Debug, Default)]
pub struct ValidationEngine {
    validation_count: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a record in place and returns its new validity.
    ///
    /// A record that fails the format stage keeps its previous
    /// `calculated_checksum`.
    pub fn validate_record(&self, record: &mut IncomeRecord) -> bool {
        self.validation_count.fetch_add(1, Ordering::Relaxed);

        let errors = format_errors(record);
        if !errors.is_empty() {
            warn!(
                "Format validation failed for {}: {}",
                record.code(),
                errors.join(", ")
            );
            record.set_valid(false);
            self.failure_count.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        for warning in check_business_rules(record) {
            warn!("Business rule warning for {}: {}", record.code(), warning);
        }

        let calculated = record_checksum(record);
        record.set_calculated_checksum(calculated);
        let valid = calculated == record.original_checksum();
        record.set_valid(valid);

        if valid {
            self.success_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failure_count.fetch_add(1, Ordering::Relaxed);
        }
        debug!(
            code = record.code(),
            calculated,
            original = record.original_checksum(),
            valid,
            "record validated"
        );
        valid
    }

    pub fn validate_records(&self, records: &mut [IncomeRecord]) -> ValidationSummary {
        let mut summary = ValidationSummary::default();
        if records.is_empty() {
            return summary;
        }

        info!("Starting batch validation of {} records", records.len());
        for record in records.iter_mut() {
            let valid = self.validate_record(record);
            summary.total_count += 1;
            if valid {
                summary.valid_records.push(record.clone());
            } else {
                summary.invalid_records.push(record.clone());
            }
        }
        info!(
            total = summary.total_count,
            valid = summary.valid_count(),
            invalid = summary.invalid_count(),
            "Batch validation completed, success rate {:.1}%",
            summary.success_rate()
        );
        summary
    }

    /// Overwrites `calculated_checksum` on every record. Validity is untouched.
    pub fn recalculate_checksums(&self, records: &mut [IncomeRecord]) -> usize {
        for record in records.iter_mut() {
            let calculated = record_checksum(record);
            record.set_calculated_checksum(calculated);
        }
        info!("Recalculated checksums for {} records", records.len());
        records.len()
    }

    /// Marks every invalid record valid by adopting the locally computed
    /// checksum as its source checksum.
    ///
    /// This discards the integrity signal of the repaired records.
    pub fn repair_invalid_records(&self, records: &mut [IncomeRecord]) -> usize {
        let mut repaired = 0;
        for record in records.iter_mut().filter(|r| !r.is_valid()) {
            let calculated = record_checksum(record);
            record.set_original_checksum(calculated);
            record.set_calculated_checksum(calculated);
            record.set_valid(true);
            repaired += 1;
        }
        info!("Repaired {} invalid records", repaired);
        repaired
    }

    /// Diagnoses a record without mutating it or the engine's counters.
    pub fn generate_detailed_report(&self, record: &IncomeRecord) -> ValidationReport {
        let mut errors: Vec<String> = format_errors(record)
            .into_iter()
            .map(str::to_string)
            .collect();

        let transaction_line = canonical_line(record);
        let breakdown = ChecksumBreakdown::of(&transaction_line);
        let calculated_checksum = breakdown.total();
        let valid = calculated_checksum == record.original_checksum();
        if !valid {
            errors.push(format!(
                "Checksum mismatch: expected {}, calculated {}",
                record.original_checksum(),
                calculated_checksum
            ));
        }

        ValidationReport {
            code: record.code().to_string(),
            transaction_line,
            breakdown,
            original_checksum: record.original_checksum(),
            calculated_checksum,
            valid,
            errors,
            warnings: check_business_rules(record),
        }
    }

    pub fn checksum_self_test(&self) -> Vec<ChecksumCase> {
        SELF_TEST_CASES
            .iter()
            .map(|&(name, input, expected)| ChecksumCase {
                name,
                input,
                expected,
                calculated: checksum(input),
            })
            .collect()
    }

    pub fn statistics(&self) -> ValidationStatistics {
        ValidationStatistics {
            total_validations: self.validation_count.load(Ordering::Relaxed),
            successful_validations: self.success_count.load(Ordering::Relaxed),
            failed_validations: self.failure_count.load(Ordering::Relaxed),
        }
    }

    pub fn reset_statistics(&self) {
        self.validation_count.store(0, Ordering::Relaxed);
        self.success_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record_with_checksum(checksum: i64) -> IncomeRecord {
        IncomeRecord::new("IN001", "Freelance Work", "25/07/2025", dec!(10000), dec!(1000))
            .unwrap()
            .with_original_checksum(checksum)
    }

    #[test]
    fn test_matching_checksum_is_valid() {
        let engine = ValidationEngine::new();
        let mut record = record_with_checksum(30);

        assert!(engine.validate_record(&mut record));
        assert!(record.is_valid());
        assert_eq!(record.calculated_checksum(), 30);
    }

    #[test]
    fn test_mismatched_checksum_is_invalid() {
        let engine = ValidationEngine::new();
        let mut record = record_with_checksum(31);

        assert!(!engine.validate_record(&mut record));
        assert!(!record.is_valid());
        assert_eq!(record.calculated_checksum(), 30);
    }

    #[test]
    fn test_format_failure_keeps_calculated_checksum() {
        let engine = ValidationEngine::new();
        let mut record =
            IncomeRecord::unchecked("bad", "", "2025-01-01", dec!(0), dec!(-1));
        record.set_calculated_checksum(7);
        record.set_valid(true);

        assert!(!engine.validate_record(&mut record));
        assert!(!record.is_valid());
        assert_eq!(record.calculated_checksum(), 7);
        assert_eq!(format_errors(&record).len(), 5);

        let stats = engine.statistics();
        assert_eq!(stats.total_validations, 1);
        assert_eq!(stats.failed_validations, 1);
    }

    #[test]
    fn test_business_rules_are_advisory() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let record =
            IncomeRecord::new("IN001", "Big", "01/01/2010", dec!(20000000), dec!(30000000)).unwrap();

        let warnings = check_business_rules_on(&record, today);
        assert_eq!(
            warnings,
            [
                BusinessWarning::WhtExceedsIncome,
                BusinessWarning::VeryHighIncome,
                BusinessWarning::StaleDate
            ]
        );

        let engine = ValidationEngine::new();
        let expected = record_checksum(&record);
        let mut record = record.with_original_checksum(expected);
        assert!(engine.validate_record(&mut record));
    }

    #[test]
    fn test_stale_date_compares_years() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let boundary = IncomeRecord::new("IN001", "Old", "01/01/2016", dec!(1), dec!(0)).unwrap();
        let older = IncomeRecord::new("IN001", "Old", "31/12/2015", dec!(1), dec!(0)).unwrap();

        assert!(check_business_rules_on(&boundary, today).is_empty());
        assert_eq!(
            check_business_rules_on(&older, today),
            [BusinessWarning::StaleDate]
        );
    }

    #[test]
    fn test_batch_summary_partitions_in_order() {
        let engine = ValidationEngine::new();
        let mut records = vec![
            record_with_checksum(30),
            record_with_checksum(0),
            record_with_checksum(30),
        ];

        let summary = engine.validate_records(&mut records);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.valid_count(), 2);
        assert_eq!(summary.invalid_count(), 1);
        assert!((summary.success_rate() - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.invalid_records[0].original_checksum(), 0);
    }

    #[test]
    fn test_empty_batch_summary() {
        let engine = ValidationEngine::new();
        let summary = engine.validate_records(&mut []);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.success_rate(), 0.0);
        assert_eq!(engine.statistics().total_validations, 0);
    }

    #[test]
    fn test_recalculate_leaves_validity_alone() {
        let engine = ValidationEngine::new();
        let mut records = vec![record_with_checksum(0)];
        records[0].set_valid(true);

        assert_eq!(engine.recalculate_checksums(&mut records), 1);
        assert_eq!(records[0].calculated_checksum(), 30);
        assert!(records[0].is_valid());
    }

    #[test]
    fn test_repair_adopts_computed_checksum() {
        let engine = ValidationEngine::new();
        let mut records = vec![record_with_checksum(30), record_with_checksum(5)];
        engine.validate_records(&mut records);

        assert_eq!(engine.repair_invalid_records(&mut records), 1);
        assert!(records.iter().all(IncomeRecord::is_valid));
        assert_eq!(records[1].original_checksum(), 30);
        assert_eq!(records[1].calculated_checksum(), 30);

        assert_eq!(engine.repair_invalid_records(&mut records), 0);
    }

    #[test]
    fn test_detailed_report_is_read_only() {
        let engine = ValidationEngine::new();
        let record = record_with_checksum(29);

        let report = engine.generate_detailed_report(&record);
        assert_eq!(
            report.transaction_line,
            "IN001,Freelance Work,25/07/2025,10000.00,1000.00"
        );
        assert_eq!(report.breakdown.uppercase, 4);
        assert_eq!(report.breakdown.digits_and_points, 26);
        assert_eq!(report.calculated_checksum, 30);
        assert_eq!(report.original_checksum, 29);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            ["Checksum mismatch: expected 29, calculated 30"]
        );

        assert_eq!(engine.statistics(), ValidationStatistics::default());
        assert_eq!(record.calculated_checksum(), 0);
    }

    #[test]
    fn test_statistics_snapshot_and_reset() {
        let engine = ValidationEngine::new();
        engine.validate_record(&mut record_with_checksum(30));
        engine.validate_record(&mut record_with_checksum(1));
        engine.validate_record(&mut record_with_checksum(30));

        let stats = engine.statistics();
        assert_eq!(stats.total_validations, 3);
        assert_eq!(stats.successful_validations, 2);
        assert_eq!(stats.failed_validations, 1);
        assert!(stats.to_string().contains("rate=66.7%"));

        engine.reset_statistics();
        assert_eq!(engine.statistics(), ValidationStatistics::default());
        assert_eq!(engine.statistics().success_rate(), 0.0);
    }

    #[test]
    fn test_checksum_self_test_passes() {
        let cases = ValidationEngine::new().checksum_self_test();
        assert_eq!(cases.len(), 3);
        assert!(cases.iter().all(ChecksumCase::passed));
        assert_eq!(cases[0].calculated, 30);
    }
}
