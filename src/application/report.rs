//! Fixed-layout text reports over a `TaxCalculationResult`.

use super::tax::{HIGH_INCOME_RATE, HIGH_INCOME_THRESHOLD, STANDARD_TAX_RATE, TaxCalculationResult};
use crate::domain::money::{Money, fixed_2dp};
use rust_decimal_macros::dec;
use std::fmt;

struct CalculationDetails<'a>(&'a TaxCalculationResult);

impl fmt::Display for CalculationDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(f, "TAX CALCULATION BREAKDOWN")?;
        writeln!(f, "========================")?;
        writeln!(f)?;

        writeln!(f, "INPUT DATA:")?;
        writeln!(f, "  Number of Records: {}", r.record_count)?;
        writeln!(f, "  Total Gross Income: {}", r.total_income.currency())?;
        writeln!(f, "  Total WHT Paid: {}", r.total_wht.currency())?;
        writeln!(
            f,
            "  Average Income per Record: {}",
            r.average_income_per_record.currency()
        )?;
        writeln!(f)?;

        writeln!(f, "TAX CALCULATION:")?;
        writeln!(f, "  Tax-Free Allowance: {}", r.tax_free_allowance.currency())?;
        writeln!(f, "  Taxable Income: {}", r.taxable_income.currency())?;
        let threshold = Money::new(HIGH_INCOME_THRESHOLD);
        if r.taxable_income > threshold {
            let standard_portion = threshold * STANDARD_TAX_RATE;
            let high_portion = (r.taxable_income - threshold) * HIGH_INCOME_RATE;
            writeln!(
                f,
                "  Standard Rate Tax ({}%): {}",
                (STANDARD_TAX_RATE * dec!(100)).normalize(),
                standard_portion.currency()
            )?;
            writeln!(
                f,
                "  High Earner Tax ({}%): {}",
                (HIGH_INCOME_RATE * dec!(100)).normalize(),
                high_portion.currency()
            )?;
        } else {
            writeln!(
                f,
                "  Tax Rate Applied: {}%",
                fixed_2dp(STANDARD_TAX_RATE * dec!(100))
            )?;
        }
        writeln!(f, "  Gross Tax Liability: {}", r.gross_tax.currency())?;
        writeln!(f, "  Less: WHT Already Paid: {}", r.total_wht.currency())?;
        writeln!(f, "  NET TAX PAYABLE: {}", r.final_tax_payable.currency())?;
        writeln!(f)?;

        writeln!(f, "ANALYSIS:")?;
        writeln!(f, "  Effective Tax Rate: {}%", fixed_2dp(r.effective_tax_rate))?;
        writeln!(f, "  WHT Coverage of Tax: {}%", fixed_2dp(r.wht_coverage))?;
        writeln!(
            f,
            "  Tax Savings from Allowance: {}",
            r.tax_savings_from_allowance.currency()
        )?;

        if !r.final_tax_payable.is_positive() {
            writeln!(f)?;
            writeln!(f, "  STATUS: No additional tax payable - WHT covers full liability")?;
        } else if r.wht_coverage > dec!(80) {
            writeln!(f)?;
            writeln!(f, "  STATUS: Low additional tax required - good WHT coverage")?;
        } else if r.wht_coverage < dec!(50) {
            writeln!(f)?;
            writeln!(
                f,
                "  STATUS: Significant additional tax required - consider increasing WHT"
            )?;
        }
        Ok(())
    }
}

pub fn calculation_details(result: &TaxCalculationResult) -> String {
    CalculationDetails(result).to_string()
}

fn compliance_header(f: &mut fmt::Formatter<'_>, generated: &str) -> fmt::Result {
    writeln!(f, "TAX COMPLIANCE REPORT")?;
    writeln!(f, "====================")?;
    writeln!(f, "Generated: {generated}")?;
    writeln!(f)
}

struct ComplianceReport<'a> {
    generated: &'a str,
    result: &'a TaxCalculationResult,
}

impl fmt::Display for ComplianceReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        compliance_header(f, self.generated)?;

        writeln!(f, "COMPLIANCE STATUS:")?;
        writeln!(f, "  Records Processed: {}", r.record_count)?;
        writeln!(f, "  Total Declared Income: {}", r.total_income.currency())?;
        writeln!(f, "  Tax Liability: {}", r.gross_tax.currency())?;
        writeln!(f, "  WHT Payments: {}", r.total_wht.currency())?;
        writeln!(f, "  Outstanding Tax: {}", r.final_tax_payable.currency())?;
        writeln!(f)?;

        writeln!(f, "COMPLIANCE INDICATORS:")?;
        if !r.final_tax_payable.is_positive() {
            writeln!(f, "  ✓ Tax liability fully covered by WHT payments")?;
        } else {
            writeln!(f, "  ⚠ Additional tax payment required")?;
        }
        if r.wht_coverage >= dec!(80) {
            writeln!(f, "  ✓ Good WHT coverage (≥80%)")?;
        } else {
            writeln!(f, "  ⚠ Low WHT coverage (<80%) - consider increasing WHT rate")?;
        }
        if r.effective_tax_rate <= dec!(15) {
            writeln!(f, "  ✓ Reasonable effective tax rate")?;
        } else {
            writeln!(f, "  ⚠ High effective tax rate - review tax planning strategies")?;
        }
        Ok(())
    }
}

pub fn compliance_report(generated: &str, result: &TaxCalculationResult) -> String {
    ComplianceReport { generated, result }.to_string()
}

struct EmptyCompliance<'a> {
    generated: &'a str,
    message: &'a str,
}

impl fmt::Display for EmptyCompliance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        compliance_header(f, self.generated)?;
        writeln!(f, "{}", self.message)
    }
}

pub fn compliance_without_data(generated: &str, message: &str) -> String {
    EmptyCompliance { generated, message }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tax::compute;
    use crate::domain::record::IncomeRecord;
    use rust_decimal::Decimal;

    fn result_for(income: Decimal, wht: Decimal) -> TaxCalculationResult {
        let record = IncomeRecord::new("IN001", "Salary", "01/04/2025", income, wht).unwrap();
        compute(&[&record]).unwrap()
    }

    #[test]
    fn test_details_layout() {
        let details = calculation_details(&result_for(dec!(200000), dec!(5000)));

        for label in [
            "TAX CALCULATION BREAKDOWN",
            "INPUT DATA:",
            "TAX CALCULATION:",
            "ANALYSIS:",
            "Total Gross Income: Rs 200,000.00",
            "Tax-Free Allowance: Rs 150,000.00",
            "Tax Rate Applied: 12.00%",
            "Gross Tax Liability: Rs 6,000.00",
            "NET TAX PAYABLE: Rs 1,000.00",
            "WHT Coverage of Tax: 83.33%",
            "STATUS: Low additional tax required",
        ] {
            assert!(details.contains(label), "missing {label:?} in\n{details}");
        }
        assert!(!details.contains("High Earner Tax"));
    }

    #[test]
    fn test_details_itemize_high_bracket() {
        let details = calculation_details(&result_for(dec!(6000000), dec!(0)));

        assert!(details.contains("Standard Rate Tax (12%): Rs 600,000.00"));
        assert!(details.contains("High Earner Tax (18%): Rs 153,000.00"));
        assert!(!details.contains("Tax Rate Applied"));
        assert!(details.contains("STATUS: Significant additional tax required"));
    }

    #[test]
    fn test_details_status_selection() {
        let covered = calculation_details(&result_for(dec!(200000), dec!(6000)));
        assert!(covered.contains("STATUS: No additional tax payable"));

        // 60% coverage sits between the two thresholds
        let middle = calculation_details(&result_for(dec!(200000), dec!(3600)));
        assert!(!middle.contains("STATUS:"));
    }

    #[test]
    fn test_compliance_indicators() {
        let report = compliance_report("2026-01-01 00:00:00", &result_for(dec!(200000), dec!(6000)));
        assert!(report.contains("Generated: 2026-01-01 00:00:00"));
        assert!(report.contains("✓ Tax liability fully covered by WHT payments"));
        assert!(report.contains("✓ Good WHT coverage (≥80%)"));
        assert!(report.contains("✓ Reasonable effective tax rate"));

        let report = compliance_report("2026-01-01 00:00:00", &result_for(dec!(20000000), dec!(0)));
        assert!(report.contains("⚠ Additional tax payment required"));
        assert!(report.contains("⚠ Low WHT coverage (<80%)"));
        assert!(report.contains("⚠ High effective tax rate"));
    }

    #[test]
    fn test_compliance_without_data() {
        let report = compliance_without_data("now", "No valid records found for compliance analysis.");
        assert!(report.starts_with("TAX COMPLIANCE REPORT"));
        assert!(report.ends_with("No valid records found for compliance analysis.\n"));
    }
}
