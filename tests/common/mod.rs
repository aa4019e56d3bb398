#![allow(dead_code)]

use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use whtax::domain::checksum::checksum;

pub const HEADER: [&str; 6] = [
    "Income_Code",
    "Description",
    "Date",
    "Income_Amount",
    "WHT_Amount",
    "Checksum",
];

const DESCRIPTIONS: [&str; 5] = ["Salary", "Consulting", "Rental Income", "Freelance Work", "Bonus"];

/// One generated data row, with the checksum its source would report.
#[derive(Debug, Clone)]
pub struct Row {
    pub code: String,
    pub description: String,
    pub date: String,
    pub income: String,
    pub wht: String,
    pub checksum: i64,
}

impl Row {
    pub fn new(code: &str, description: &str, date: &str, income: &str, wht: &str) -> Self {
        let line = format!("{code},{description},{date},{income},{wht}");
        Self {
            code: code.to_string(),
            description: description.to_string(),
            date: date.to_string(),
            income: income.to_string(),
            wht: wht.to_string(),
            checksum: checksum(&line),
        }
    }

    /// Same row with a checksum that can never match.
    pub fn tampered(mut self) -> Self {
        self.checksum += 1;
        self
    }

    pub fn fields(&self) -> [String; 6] {
        [
            self.code.clone(),
            self.description.clone(),
            self.date.clone(),
            self.income.clone(),
            self.wht.clone(),
            self.checksum.to_string(),
        ]
    }
}

/// Random but well formed rows. `seed` keeps test runs reproducible.
pub fn random_rows(seed: u64, count: usize) -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let prefix: String = (0..2).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect();
            let code = format!("{prefix}{:03}", i % 1000);
            let description = DESCRIPTIONS[rng.gen_range(0..DESCRIPTIONS.len())];
            let date = format!(
                "{:02}/{:02}/{}",
                rng.gen_range(1..=28),
                rng.gen_range(1..=12),
                rng.gen_range(2020..=2025)
            );
            let cents: u64 = rng.gen_range(100..=100_000_000);
            let income = format!("{}.{:02}", cents / 100, cents % 100);
            let wht_cents = cents / 10;
            let wht = format!("{}.{:02}", wht_cents / 100, wht_cents % 100);
            Row::new(&code, description, &date, &income, &wht)
        })
        .collect()
}

pub fn write_rows(path: &Path, rows: &[Row]) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(file);

    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.write_record(row.fields())?;
    }
    wtr.flush()?;
    Ok(())
}
