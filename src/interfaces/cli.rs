//! Command line front end: argument definitions and the command runner.
//!
//! Commands write their results to the sink handed to [`run`]. Diagnostics go
//! through `tracing`, so stdout only ever carries command output.

use crate::application::tax::TaxProcessor;
use crate::application::validation::{
    ChecksumCase, ValidationEngine, ValidationReport, ValidationStatistics,
};
use crate::domain::money::fixed_2dp;
use crate::domain::ports::{LineError, RecordStore, RecordStoreBox};
use crate::domain::record::{IncomeRecord, SortKey, sort_records};
use crate::error::{LedgerError, Result};
use crate::infrastructure::csv_file::{CsvFileStore, FileReport, has_csv_extension};
use crate::infrastructure::snapshot_file::SnapshotFileStore;
use clap::{ArgAction, Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "whtax", author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print structured results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate the records of a CSV file or pipe snapshot
    Validate(ValidateArgs),
    /// Validate the records, then compute the net tax payable
    Tax {
        /// Input records (.csv, or a pipe snapshot for any other extension)
        input: PathBuf,
    },
    /// Print the compliance report for the valid records of an input
    Compliance {
        /// Input records (.csv, or a pipe snapshot for any other extension)
        input: PathBuf,
    },
    /// Recommend a WHT amount for a projected yearly income
    Strategy {
        /// Projected yearly income
        projected_income: Decimal,
    },
    /// Compare the tax due on a base income under several variations
    Scenarios {
        /// Base yearly income
        base_income: Decimal,
        /// Amounts added to the base income, one scenario each
        #[arg(required = true, allow_negative_numbers = true)]
        variations: Vec<Decimal>,
    },
    /// Report file facts and the CSV structure of an input without importing it
    Inspect {
        /// File to inspect
        input: PathBuf,
    },
    /// Run the checksum algorithm against its reference lines
    SelfTest,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input records (.csv, or a pipe snapshot for any other extension)
    pub input: PathBuf,

    /// Print a detailed validation report for every record
    #[arg(long)]
    pub report: bool,

    /// Recompute the checksum written on export for every record
    #[arg(long)]
    pub recalculate: bool,

    /// Mark invalid records valid by adopting their recomputed checksum
    #[arg(long)]
    pub repair: bool,

    /// Leave invalid records out of exports
    #[arg(long)]
    pub drop_invalid: bool,

    /// Order records before exporting them
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    /// Write the records to a CSV file
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Write the records to a pipe snapshot
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,
}

/// Picks the store for an input path: `.csv` files are read as CSV, anything
/// else as a pipe snapshot.
pub fn store_for(path: &Path) -> RecordStoreBox {
    if has_csv_extension(path) {
        Box::new(CsvFileStore::new(path))
    } else {
        Box::new(SnapshotFileStore::new(path))
    }
}

/// Executes a parsed command line, writing its output to `out`.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Command::Validate(args) => validate(&args, json, out),
        Command::Tax { input } => tax(&input, json, out),
        Command::Compliance { input } => compliance(&input, json, out),
        Command::Strategy { projected_income } => strategy(projected_income, json, out),
        Command::Scenarios {
            base_income,
            variations,
        } => scenarios(base_income, &variations, json, out),
        Command::Inspect { input } => inspect(&input, json, out),
        Command::SelfTest => self_test(json, out),
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

/// Loads and validates every record of `input`.
fn load_validated(
    input: &Path,
    engine: &ValidationEngine,
) -> Result<(Vec<IncomeRecord>, Vec<LineError>)> {
    let outcome = store_for(input).load()?;
    let mut records = outcome.records;
    engine.validate_records(&mut records);
    Ok((records, outcome.errors))
}

#[derive(Serialize)]
struct ValidateOutput<'a> {
    total: usize,
    valid: usize,
    invalid: usize,
    success_rate: f64,
    statistics: ValidationStatistics,
    skipped_lines: &'a [LineError],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    reports: Vec<ValidationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recalculated: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    repaired: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exported: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshotted: Option<usize>,
}

fn validate<W: Write>(args: &ValidateArgs, json: bool, out: &mut W) -> Result<()> {
    let engine = ValidationEngine::new();
    let outcome = store_for(&args.input).load()?;
    let mut records = outcome.records;
    let summary = engine.validate_records(&mut records);

    let reports = if args.report {
        records
            .iter()
            .map(|record| engine.generate_detailed_report(record))
            .collect()
    } else {
        Vec::new()
    };

    let recalculated = args
        .recalculate
        .then(|| engine.recalculate_checksums(&mut records));
    let repaired = args
        .repair
        .then(|| engine.repair_invalid_records(&mut records));
    if args.drop_invalid {
        records.retain(IncomeRecord::is_valid);
    }
    if let Some(key) = args.sort {
        sort_records(&mut records, key);
    }

    let exported = match &args.export {
        Some(path) => Some(CsvFileStore::new(path).save(&records)?),
        None => None,
    };
    let snapshotted = match &args.snapshot {
        Some(path) => Some(SnapshotFileStore::new(path).save(&records)?),
        None => None,
    };

    let output = ValidateOutput {
        total: summary.total_count,
        valid: summary.valid_count(),
        invalid: summary.invalid_count(),
        success_rate: summary.success_rate(),
        statistics: engine.statistics(),
        skipped_lines: &outcome.errors,
        reports,
        recalculated,
        repaired,
        exported,
        snapshotted,
    };
    if json {
        return write_json(out, &output);
    }

    writeln!(out, "Total: {}", output.total)?;
    writeln!(out, "Valid: {}", output.valid)?;
    writeln!(out, "Invalid: {}", output.invalid)?;
    writeln!(out, "Success Rate: {:.1}%", output.success_rate)?;
    if !output.skipped_lines.is_empty() {
        writeln!(out, "Skipped Lines: {}", output.skipped_lines.len())?;
        for line in output.skipped_lines {
            writeln!(out, "  {line}")?;
        }
    }
    for report in &output.reports {
        writeln!(out)?;
        writeln!(out, "{report}")?;
    }
    if let Some(recalculated) = output.recalculated {
        writeln!(out, "Recalculated: {recalculated}")?;
    }
    if let Some(repaired) = output.repaired {
        writeln!(out, "Repaired: {repaired}")?;
    }
    if let (Some(count), Some(path)) = (output.exported, &args.export) {
        writeln!(out, "Exported {count} records to {}", path.display())?;
    }
    if let (Some(count), Some(path)) = (output.snapshotted, &args.snapshot) {
        writeln!(out, "Saved {count} records to {}", path.display())?;
    }
    Ok(())
}

fn tax<W: Write>(input: &Path, json: bool, out: &mut W) -> Result<()> {
    let engine = ValidationEngine::new();
    let (records, _) = load_validated(input, &engine)?;

    let processor = TaxProcessor::new();
    let payable = processor.calculate_tax(&records).inspect_err(|e| {
        error!("Tax calculation failed for {}: {e}", input.display());
    })?;

    if json {
        return write_json(out, &processor.calculate_result(&records)?);
    }
    write!(out, "{}", processor.calculation_details(&records)?)?;
    writeln!(out)?;
    writeln!(out, "Net Tax Payable: {}", payable.currency())?;
    Ok(())
}

fn compliance<W: Write>(input: &Path, json: bool, out: &mut W) -> Result<()> {
    let engine = ValidationEngine::new();
    let (records, _) = load_validated(input, &engine)?;
    let processor = TaxProcessor::new();

    if json {
        return write_json(out, &processor.calculate_result(&records)?);
    }
    write!(out, "{}", processor.compliance_report(&records)?)?;
    Ok(())
}

fn strategy<W: Write>(projected_income: Decimal, json: bool, out: &mut W) -> Result<()> {
    let strategy = TaxProcessor::new().calculate_optimal_wht(projected_income)?;
    if json {
        return write_json(out, &strategy);
    }

    writeln!(out, "WHT STRATEGY")?;
    writeln!(out, "  Projected Income: {}", strategy.projected_income.currency())?;
    writeln!(
        out,
        "  Projected Tax Liability: {}",
        strategy.projected_tax_liability.currency()
    )?;
    writeln!(
        out,
        "  Recommended WHT: {}",
        strategy.recommended_wht_amount.currency()
    )?;
    writeln!(
        out,
        "  Recommended WHT Rate: {}%",
        fixed_2dp(strategy.recommended_wht_rate)
    )?;
    writeln!(out, "  Monthly WHT: {}", strategy.monthly_wht.currency())?;
    Ok(())
}

fn scenarios<W: Write>(
    base_income: Decimal,
    variations: &[Decimal],
    json: bool,
    out: &mut W,
) -> Result<()> {
    let scenarios = TaxProcessor::new().analyze_tax_scenarios(base_income, variations)?;
    if json {
        return write_json(out, &scenarios);
    }

    writeln!(out, "TAX SCENARIOS")?;
    for (variation, scenario) in variations.iter().zip(&scenarios) {
        writeln!(out)?;
        writeln!(out, "Variation {}:", fixed_2dp(*variation))?;
        writeln!(out, "  Total Income: {}", scenario.total_income.currency())?;
        writeln!(out, "  Taxable Income: {}", scenario.taxable_income.currency())?;
        writeln!(out, "  Gross Tax: {}", scenario.gross_tax.currency())?;
        writeln!(out, "  Effective Rate: {}%", fixed_2dp(scenario.effective_rate))?;
        writeln!(out, "  Marginal Rate: {}%", scenario.marginal_rate.normalize())?;
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn inspect<W: Write>(input: &Path, json: bool, out: &mut W) -> Result<()> {
    let report = FileReport::inspect(input)?;
    if json {
        return write_json(out, &report);
    }

    writeln!(out, "File: {}", report.path.display())?;
    writeln!(out, "  Exists: {}", yes_no(report.exists))?;
    if report.exists {
        writeln!(out, "  Size: {} bytes", report.size_bytes)?;
        if let Some(modified) = report.modified {
            writeln!(out, "  Last Modified: {}", modified.format("%Y-%m-%d %H:%M:%S"))?;
        }
        writeln!(out, "  Readable: {}", yes_no(report.readable))?;
        writeln!(out, "  Writable: {}", yes_no(report.writable))?;
        writeln!(out, "  Lines: {}", report.line_count)?;
        writeln!(out, "  Estimated Records: {}", report.estimated_records)?;
    }

    let structure = &report.structure;
    writeln!(
        out,
        "Structure: {}",
        if structure.valid { "valid" } else { "invalid" }
    )?;
    for error in &structure.errors {
        writeln!(out, "  Error: {error}")?;
    }
    for warning in &structure.warnings {
        writeln!(out, "  Warning: {warning}")?;
    }
    for info in &structure.info {
        writeln!(out, "  Info: {info}")?;
    }
    Ok(())
}

/// Fails when any case with an expected value disagrees with it.
fn check_self_test(cases: &[ChecksumCase]) -> Result<()> {
    let failed: Vec<&str> = cases
        .iter()
        .filter(|case| !case.passed())
        .map(|case| case.name)
        .collect();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::SelfTestError(format!(
            "checksum mismatch in {}",
            failed.join(", ")
        )))
    }
}

fn self_test<W: Write>(json: bool, out: &mut W) -> Result<()> {
    let cases = ValidationEngine::new().checksum_self_test();

    if json {
        write_json(out, &cases)?;
    } else {
        for case in &cases {
            let expected = case
                .expected
                .map_or_else(|| "-".to_string(), |expected| expected.to_string());
            writeln!(
                out,
                "{}: {} -> calculated {}, expected {} [{}]",
                case.name,
                case.input,
                case.calculated,
                expected,
                if case.passed() { "PASS" } else { "FAIL" }
            )?;
        }
    }

    check_self_test(&cases)?;
    info!("Checksum self-test passed");
    Ok(())
}
