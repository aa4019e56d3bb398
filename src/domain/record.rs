use super::money::{CURRENCY_LABEL, Money, fixed_2dp};
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9]{3}$").expect("valid code pattern"));
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid date pattern"));

const DATE_FORMAT: &str = "%d/%m/%Y";
const MAX_DESCRIPTION_LENGTH: usize = 20;

pub fn is_valid_code(code: &str) -> bool {
    let normalized = code.trim().to_ascii_uppercase();
    CODE_PATTERN.is_match(&normalized)
}

pub fn is_valid_description(description: &str) -> bool {
    let trimmed = description.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= MAX_DESCRIPTION_LENGTH
}

/// `DD/MM/YYYY` that also names a real calendar day.
pub fn is_valid_date(date: &str) -> bool {
    let trimmed = date.trim();
    DATE_PATTERN.is_match(trimmed) && NaiveDate::parse_from_str(trimmed, DATE_FORMAT).is_ok()
}

pub fn is_valid_income_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO
}

pub fn is_valid_wht_amount(amount: Decimal) -> bool {
    amount >= Decimal::ZERO
}

/// A single income transaction as imported from a data source.
///
/// Business fields are validated once, at construction, and never change
/// afterwards: `updated` returns a new record instead. The checksum pair and
/// the validity flag are owned by the validation engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeRecord {
    code: String,
    description: String,
    date: String,
    income_amount: Money,
    wht_amount: Money,
    original_checksum: i64,
    calculated_checksum: i64,
    valid: bool,
}

impl IncomeRecord {
    /// Creates a record with `original_checksum = 0`, not yet validated.
    pub fn new(
        code: &str,
        description: &str,
        date: &str,
        income_amount: Decimal,
        wht_amount: Decimal,
    ) -> Result<Self> {
        if !is_valid_code(code) {
            return Err(LedgerError::FormatError(
                "Invalid income code format. Must be 2 letters + 3 digits (e.g., IN001)"
                    .to_string(),
            ));
        }
        let (description, date, income_amount, wht_amount) =
            validated_fields(description, date, income_amount, wht_amount)?;

        Ok(Self {
            code: code.trim().to_ascii_uppercase(),
            description,
            date,
            income_amount,
            wht_amount,
            original_checksum: 0,
            calculated_checksum: 0,
            valid: false,
        })
    }

    /// Sets the checksum supplied by the data source.
    pub fn with_original_checksum(mut self, checksum: i64) -> Self {
        self.original_checksum = checksum;
        self
    }

    /// Returns a copy with replaced business fields and `valid` reset.
    ///
    /// The code and both checksums carry over unchanged, so the new record
    /// fails validation until its source checksum is brought in line.
    pub fn updated(
        &self,
        description: &str,
        date: &str,
        income_amount: Decimal,
        wht_amount: Decimal,
    ) -> Result<Self> {
        let (description, date, income_amount, wht_amount) =
            validated_fields(description, date, income_amount, wht_amount)?;
        Ok(Self {
            code: self.code.clone(),
            description,
            date,
            income_amount,
            wht_amount,
            original_checksum: self.original_checksum,
            calculated_checksum: self.calculated_checksum,
            valid: false,
        })
    }

    /// Parses `CODE,DESCRIPTION,DATE,INCOME,WHT[,CHECKSUM]`.
    ///
    /// Fields are split on every comma; quoting is not supported.
    pub fn from_csv_line(line: &str) -> Result<Self> {
        if line.trim().is_empty() {
            return Err(LedgerError::ParseError(
                "CSV line cannot be empty".to_string(),
            ));
        }
        let fields: Vec<&str> = line.split(',').collect();
        Self::from_csv_fields(&fields)
    }

    fn from_csv_fields(fields: &[&str]) -> Result<Self> {
        if fields.len() < 5 {
            return Err(LedgerError::ParseError(
                "Insufficient CSV data fields".to_string(),
            ));
        }
        let income = parse_amount(fields[3])?;
        let wht = parse_amount(fields[4])?;
        let checksum = match fields.get(5).map(|f| f.trim()) {
            Some(raw) if !raw.is_empty() => raw.parse::<i64>().map_err(|e| {
                LedgerError::ParseError(format!("Invalid checksum '{raw}': {e}"))
            })?,
            _ => 0,
        };

        Ok(Self::new(fields[0], fields[1], fields[2], income, wht)?
            .with_original_checksum(checksum))
    }

    /// Parses the pipe snapshot format `CODE|DESCRIPTION|DATE|INCOME|WHT`.
    pub fn from_data_line(line: &str) -> Result<Self> {
        if line.trim().is_empty() {
            return Err(LedgerError::ParseError(
                "Data line cannot be empty".to_string(),
            ));
        }
        let fields: Vec<&str> = line.trim().split('|').collect();
        Self::from_data_fields(&fields)
    }

    fn from_data_fields(fields: &[&str]) -> Result<Self> {
        if fields.len() != 5 {
            return Err(LedgerError::ParseError(format!(
                "Invalid data line format: expected 5 fields, found {}",
                fields.len()
            )));
        }
        let income = parse_amount(fields[3])?;
        let wht = parse_amount(fields[4])?;
        Self::new(fields[0], fields[1], fields[2], income, wht)
    }

    pub fn csv_fields(&self) -> [String; 6] {
        [
            self.code.clone(),
            self.description.clone(),
            self.date.clone(),
            fixed_2dp(self.income_amount.value()),
            fixed_2dp(self.wht_amount.value()),
            self.calculated_checksum.to_string(),
        ]
    }

    /// `CODE,DESCRIPTION,DATE,INCOME,WHT,CALCULATED_CHECKSUM`.
    pub fn to_csv_line(&self) -> String {
        self.csv_fields().join(",")
    }

    pub fn data_fields(&self) -> [String; 5] {
        [
            self.code.clone(),
            self.description.clone(),
            self.date.clone(),
            fixed_2dp(self.income_amount.value()),
            fixed_2dp(self.wht_amount.value()),
        ]
    }

    pub fn to_data_line(&self) -> String {
        self.data_fields().join("|")
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    pub fn income_amount(&self) -> Money {
        self.income_amount
    }

    pub fn wht_amount(&self) -> Money {
        self.wht_amount
    }

    pub fn net_income(&self) -> Money {
        (self.income_amount - self.wht_amount).max(Money::ZERO)
    }

    pub fn original_checksum(&self) -> i64 {
        self.original_checksum
    }

    pub fn calculated_checksum(&self) -> i64 {
        self.calculated_checksum
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub(crate) fn set_original_checksum(&mut self, checksum: i64) {
        self.original_checksum = checksum;
    }

    pub(crate) fn set_calculated_checksum(&mut self, checksum: i64) {
        self.calculated_checksum = checksum;
    }

    pub(crate) fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// Builds a record without any field checks, for exercising the
    /// validation engine's own format stage.
    #[cfg(test)]
    pub(crate) fn unchecked(
        code: &str,
        description: &str,
        date: &str,
        income_amount: Decimal,
        wht_amount: Decimal,
    ) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            date: date.to_string(),
            income_amount: Money::new(income_amount),
            wht_amount: Money::new(wht_amount),
            original_checksum: 0,
            calculated_checksum: 0,
            valid: false,
        }
    }
}

fn validated_fields(
    description: &str,
    date: &str,
    income_amount: Decimal,
    wht_amount: Decimal,
) -> Result<(String, String, Money, Money)> {
    if !is_valid_description(description) {
        return Err(LedgerError::FormatError(format!(
            "Description must be 1-{MAX_DESCRIPTION_LENGTH} characters long"
        )));
    }
    if !is_valid_date(date) {
        return Err(LedgerError::FormatError(
            "Date must be in DD/MM/YYYY format and valid".to_string(),
        ));
    }
    if !is_valid_income_amount(income_amount) {
        return Err(LedgerError::FormatError(
            "Income amount must be positive".to_string(),
        ));
    }
    if !is_valid_wht_amount(wht_amount) {
        return Err(LedgerError::FormatError(
            "WHT amount cannot be negative".to_string(),
        ));
    }
    Ok((
        description.trim().to_string(),
        date.trim().to_string(),
        Money::rounded(income_amount),
        Money::rounded(wht_amount),
    ))
}

fn parse_amount(raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|e| LedgerError::ParseError(format!("Invalid numeric data '{trimmed}': {e}")))
}

impl fmt::Display for IncomeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Income Record Details:")?;
        writeln!(f, "  Code: {}", self.code)?;
        writeln!(f, "  Description: {}", self.description)?;
        writeln!(f, "  Date: {}", self.date)?;
        writeln!(f, "  Income Amount: {CURRENCY_LABEL} {}", self.income_amount)?;
        writeln!(f, "  WHT Amount: {CURRENCY_LABEL} {}", self.wht_amount)?;
        writeln!(f, "  Net Income: {CURRENCY_LABEL} {}", self.net_income())?;
        writeln!(f, "  Original Checksum: {}", self.original_checksum)?;
        writeln!(f, "  Calculated Checksum: {}", self.calculated_checksum)?;
        write!(f, "  Status: {}", if self.valid { "Valid" } else { "Invalid" })
    }
}

/// Orderings offered when listing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    Code,
    Date,
    Amount,
    Description,
}

impl SortKey {
    pub fn compare(&self, a: &IncomeRecord, b: &IncomeRecord) -> Ordering {
        match self {
            SortKey::Code => a.code.cmp(&b.code),
            SortKey::Date => a.calendar_date().cmp(&b.calendar_date()),
            SortKey::Amount => a.income_amount.cmp(&b.income_amount),
            SortKey::Description => a.description.cmp(&b.description),
        }
    }
}

/// Stable sort, so records with equal keys keep their import order.
pub fn sort_records(records: &mut [IncomeRecord], key: SortKey) {
    records.sort_by(|a, b| key.compare(a, b));
}
