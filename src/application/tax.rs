use super::report;
use crate::domain::money::{Money, checked_total};
use crate::domain::record::IncomeRecord;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

pub const TAX_FREE_ALLOWANCE: Decimal = dec!(150000.00);
pub const STANDARD_TAX_RATE: Decimal = dec!(0.12);
pub const HIGH_INCOME_THRESHOLD: Decimal = dec!(5000000.00);
pub const HIGH_INCOME_RATE: Decimal = dec!(0.18);

/// Share of the projected liability the WHT strategy recommends withholding.
const RECOMMENDED_WHT_SHARE: Decimal = dec!(0.90);
const HUNDRED: Decimal = dec!(100);

/// Full breakdown of one tax computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxCalculationResult {
    pub record_count: usize,
    pub total_income: Money,
    pub total_wht: Money,
    pub tax_free_allowance: Money,
    pub taxable_income: Money,
    pub gross_tax: Money,
    pub final_tax_payable: Money,
    /// Percent of total income.
    pub effective_tax_rate: Decimal,
    /// Percent of gross tax already withheld.
    pub wht_coverage: Decimal,
    pub average_income_per_record: Money,
    pub tax_savings_from_allowance: Money,
}

/// Audit trail entry written by every successful `calculate_tax`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxCalculationRecord {
    pub timestamp: DateTime<Local>,
    pub record_count: usize,
    pub result: TaxCalculationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhtStrategy {
    pub projected_income: Money,
    pub projected_tax_liability: Money,
    pub recommended_wht_amount: Money,
    /// Percent of projected income.
    pub recommended_wht_rate: Decimal,
    pub monthly_wht: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxScenario {
    pub total_income: Money,
    pub taxable_income: Money,
    pub gross_tax: Money,
    pub net_tax_without_wht: Money,
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
}

/// Income left after the tax-free allowance, never negative.
pub fn taxable_income(total_income: Money) -> Money {
    if total_income.value() <= TAX_FREE_ALLOWANCE {
        Money::ZERO
    } else {
        total_income - Money::new(TAX_FREE_ALLOWANCE)
    }
}

/// Gross tax on a taxable income, rounded to the cent.
///
/// Income up to the high-income threshold is taxed at the standard rate and
/// only the excess above it at the high rate.
pub fn progressive_tax(taxable_income: Money) -> Money {
    if !taxable_income.is_positive() {
        return Money::ZERO;
    }
    let threshold = Money::new(HIGH_INCOME_THRESHOLD);
    let tax = if taxable_income <= threshold {
        taxable_income * STANDARD_TAX_RATE
    } else {
        threshold * STANDARD_TAX_RATE + (taxable_income - threshold) * HIGH_INCOME_RATE
    };
    tax.round_cents()
}

/// Rate of the bracket the next unit of income falls into, in percent.
pub fn marginal_rate(total_income: Money) -> Decimal {
    let taxable = taxable_income(total_income);
    if !taxable.is_positive() {
        Decimal::ZERO
    } else if taxable.value() <= HIGH_INCOME_THRESHOLD {
        STANDARD_TAX_RATE * HUNDRED
    } else {
        HIGH_INCOME_RATE * HUNDRED
    }
}

fn out_of_range(what: &str) -> LedgerError {
    LedgerError::ArgumentError(format!("{what} is outside the supported amount range"))
}

fn percent_of(part: Money, whole: Money, what: &str) -> Result<Decimal> {
    if !whole.is_positive() {
        return Ok(Decimal::ZERO);
    }
    part.value()
        .checked_div(whole.value())
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .ok_or_else(|| out_of_range(what))
}

/// Computes a tax result for records the caller has already filtered.
///
/// Fails with `ArgumentError` when a total or a ratio does not fit in a
/// `Decimal`.
pub fn compute(records: &[&IncomeRecord]) -> Result<TaxCalculationResult> {
    let total_income = checked_total(records.iter().map(|r| r.income_amount()))
        .ok_or_else(|| out_of_range("Total income"))?;
    let total_wht = checked_total(records.iter().map(|r| r.wht_amount()))
        .ok_or_else(|| out_of_range("Total WHT"))?;

    let taxable_income = taxable_income(total_income);
    let gross_tax = progressive_tax(taxable_income);
    let final_tax_payable = (gross_tax - total_wht).max(Money::ZERO);
    let average_income_per_record = if records.is_empty() {
        Money::ZERO
    } else {
        Money::new(total_income.value() / Decimal::from(records.len()))
    };

    Ok(TaxCalculationResult {
        record_count: records.len(),
        total_income,
        total_wht,
        tax_free_allowance: Money::new(TAX_FREE_ALLOWANCE),
        taxable_income,
        gross_tax,
        final_tax_payable,
        effective_tax_rate: percent_of(final_tax_payable, total_income, "Effective tax rate")?,
        wht_coverage: percent_of(total_wht, gross_tax, "WHT coverage")?,
        average_income_per_record,
        tax_savings_from_allowance: Money::new(TAX_FREE_ALLOWANCE) * STANDARD_TAX_RATE,
    })
}

fn valid_only(records: &[IncomeRecord]) -> Vec<&IncomeRecord> {
    records.iter().filter(|r| r.is_valid()).collect()
}

/// Progressive tax engine with an in-memory audit history.
///
/// Only records flagged valid by the validation engine contribute to a
/// calculation. The history sits behind a mutex so a processor shared
/// between threads never drops an entry.
#[derive(Debug, Default)]
pub struct TaxProcessor {
    history: Mutex<Vec<TaxCalculationRecord>>,
}

impl TaxProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net tax payable over the valid records of `records`.
    ///
    /// Fails with `ArgumentError` when `records` is empty or none of them is
    /// valid. Each success is appended to the history.
    pub fn calculate_tax(&self, records: &[IncomeRecord]) -> Result<Money> {
        if records.is_empty() {
            return Err(LedgerError::ArgumentError(
                "No valid records provided for tax calculation".to_string(),
            ));
        }
        let valid = valid_only(records);
        if valid.is_empty() {
            return Err(LedgerError::ArgumentError(
                "No valid records found in the provided list".to_string(),
            ));
        }

        let result = compute(&valid).inspect_err(|e| warn!("Tax calculation rejected: {e}"))?;
        info!(
            records = result.record_count,
            total_income = %result.total_income,
            tax_payable = %result.final_tax_payable,
            effective_rate = %result.effective_tax_rate.round_dp(2),
            "Tax calculation completed"
        );

        let payable = result.final_tax_payable;
        self.lock_history().push(TaxCalculationRecord {
            timestamp: Local::now(),
            record_count: valid.len(),
            result,
        });
        Ok(payable)
    }

    /// Full result over the valid records, without touching the history.
    ///
    /// `None` when no record is valid.
    pub fn calculate_result(&self, records: &[IncomeRecord]) -> Result<Option<TaxCalculationResult>> {
        let valid = valid_only(records);
        if valid.is_empty() {
            return Ok(None);
        }
        compute(&valid).map(Some)
    }

    pub fn calculation_details(&self, records: &[IncomeRecord]) -> Result<String> {
        Ok(match self.calculate_result(records)? {
            Some(result) => report::calculation_details(&result),
            None => "No valid records available for calculation.".to_string(),
        })
    }

    pub fn calculate_optimal_wht(&self, projected_income: Decimal) -> Result<WhtStrategy> {
        let projected_income = Money::new(projected_income);
        let projected_tax = progressive_tax(taxable_income(projected_income));
        let recommended = projected_tax * RECOMMENDED_WHT_SHARE;

        Ok(WhtStrategy {
            projected_income,
            projected_tax_liability: projected_tax,
            recommended_wht_amount: recommended,
            recommended_wht_rate: percent_of(recommended, projected_income, "WHT rate")?,
            monthly_wht: Money::new(recommended.value() / dec!(12)),
        })
    }

    /// One scenario per variation, each taxing `base_income + variation`.
    ///
    /// Fails with `ArgumentError` when a scenario income does not fit in a
    /// `Decimal`.
    pub fn analyze_tax_scenarios(
        &self,
        base_income: Decimal,
        variations: &[Decimal],
    ) -> Result<Vec<TaxScenario>> {
        variations
            .iter()
            .map(|&variation| {
                let total_income = base_income
                    .checked_add(variation)
                    .map(Money::new)
                    .ok_or_else(|| out_of_range("Scenario income"))?;
                let taxable = taxable_income(total_income);
                let gross_tax = progressive_tax(taxable);
                Ok(TaxScenario {
                    total_income,
                    taxable_income: taxable,
                    gross_tax,
                    net_tax_without_wht: gross_tax,
                    effective_rate: percent_of(gross_tax, total_income, "Effective rate")?,
                    marginal_rate: marginal_rate(total_income),
                })
            })
            .collect()
    }

    pub fn compliance_report(&self, records: &[IncomeRecord]) -> Result<String> {
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        if records.is_empty() {
            return Ok(report::compliance_without_data(
                &generated,
                "No records available for compliance analysis.",
            ));
        }
        Ok(match self.calculate_result(records)? {
            Some(result) => report::compliance_report(&generated, &result),
            None => report::compliance_without_data(
                &generated,
                "No valid records found for compliance analysis.",
            ),
        })
    }

    /// Copy of the audit history, oldest first.
    pub fn history(&self) -> Vec<TaxCalculationRecord> {
        self.lock_history().clone()
    }

    pub fn clear_history(&self) {
        self.lock_history().clear();
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<TaxCalculationRecord>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
