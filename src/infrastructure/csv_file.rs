use crate::domain::ports::{ImportOutcome, RecordStore};
use crate::domain::record::IncomeRecord;
use crate::error::{LedgerError, Result};
use crate::interfaces::csv::record_reader::{RecordReader, is_header_line};
use crate::interfaces::csv::record_writer::RecordWriter;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Record store backed by a `.csv` file.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Rejects paths an import cannot read from.
fn check_importable(path: &Path) -> io::Result<()> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "File path cannot be empty",
        ));
    }
    if !path.exists() {
        return Err(io::Error::new(
            ErrorKind::NotFound,
            format!("File does not exist: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("File must be a CSV file: {}", path.display()),
        ));
    }
    Ok(())
}

pub(crate) fn create_parent_dirs(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

impl RecordStore for CsvFileStore {
    fn load(&self) -> Result<ImportOutcome> {
        check_importable(&self.path)?;
        let file = File::open(&self.path)?;
        let outcome = RecordReader::new(file).import();
        info!(
            path = %self.path.display(),
            records = outcome.records.len(),
            errors = outcome.errors.len(),
            "Import completed"
        );
        Ok(outcome)
    }

    fn save(&self, records: &[IncomeRecord]) -> Result<usize> {
        if records.is_empty() {
            return Err(LedgerError::ArgumentError(
                "No records to export".to_string(),
            ));
        }
        create_parent_dirs(&self.path)?;
        let file = File::create(&self.path)?;
        let written = RecordWriter::new(BufWriter::new(file)).write_records(records)?;
        info!(path = %self.path.display(), records = written, "Export completed");
        Ok(written)
    }
}

/// Outcome of a structural check of a CSV file, without decoding records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureCheck {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

/// File system facts about an input file plus its structural check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub exists: bool,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
    pub readable: bool,
    pub writable: bool,
    pub line_count: u64,
    /// Lines minus one header line.
    pub estimated_records: u64,
    pub structure: StructureCheck,
}

impl FileReport {
    /// Inspects `path`. A missing file is reported, not treated as an error;
    /// only a failing read of an existing file is.
    pub fn inspect(path: &Path) -> Result<Self> {
        let mut report = Self {
            path: path.to_path_buf(),
            exists: path.exists(),
            size_bytes: 0,
            modified: None,
            readable: false,
            writable: false,
            line_count: 0,
            estimated_records: 0,
            structure: StructureCheck::default(),
        };

        if report.exists {
            let metadata = fs::metadata(path)?;
            report.size_bytes = metadata.len();
            report.modified = metadata.modified().ok().map(DateTime::<Local>::from);
            report.writable = !metadata.permissions().readonly();
            if let Ok(file) = File::open(path) {
                report.readable = true;
                report.line_count = BufReader::new(file)
                    .split(b'\n')
                    .try_fold(0u64, |count, line| line.map(|_| count + 1))?;
                report.estimated_records = report.line_count.saturating_sub(1);
            }
        }
        report.structure = check_structure(path)?;
        debug!(path = %path.display(), lines = report.line_count, "Inspected file");
        Ok(report)
    }
}

/// Checks extension, existence, emptiness and the shape of the first line.
pub fn check_structure(path: &Path) -> Result<StructureCheck> {
    let mut check = StructureCheck::default();
    if !has_csv_extension(path) {
        check.errors.push("File must have .csv extension".to_string());
        return Ok(check);
    }
    if !path.exists() {
        check.errors.push("File does not exist".to_string());
        return Ok(check);
    }
    if fs::metadata(path)?.len() == 0 {
        check.errors.push("File is empty".to_string());
        return Ok(check);
    }

    let mut first_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first_line)?;
    let first_line = first_line.trim_end_matches(['\r', '\n']);
    if !first_line.contains(',') {
        check
            .warnings
            .push("File does not appear to be comma-separated".to_string());
    }
    if is_header_line(first_line) {
        check.info.push("Valid CSV header detected".to_string());
    } else {
        check.warnings.push("No standard header found".to_string());
    }
    check.valid = true;
    Ok(check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_csv_extension_is_case_insensitive() {
        assert!(has_csv_extension(Path::new("income.csv")));
        assert!(has_csv_extension(Path::new("INCOME.CSV")));
        assert!(!has_csv_extension(Path::new("income.txt")));
        assert!(!has_csv_extension(Path::new("csv")));
    }

    #[test]
    fn test_load_rejects_bad_paths() {
        let dir = tempfile::tempdir().unwrap();

        let empty = CsvFileStore::new("");
        assert!(matches!(empty.load(), Err(LedgerError::IoError(_))));

        let missing = CsvFileStore::new(dir.path().join("missing.csv"));
        assert!(matches!(
            missing.load(),
            Err(LedgerError::IoError(e)) if e.kind() == ErrorKind::NotFound
        ));

        let txt = dir.path().join("income.txt");
        fs::write(&txt, "IN001,Work,01/01/2025,100,10,20\n").unwrap();
        assert!(matches!(
            CsvFileStore::new(&txt).load(),
            Err(LedgerError::IoError(e)) if e.kind() == ErrorKind::InvalidInput
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvFileStore::new(dir.path().join("nested/out/income.csv"));
        let record =
            IncomeRecord::new("IN001", "Work", "01/01/2025", dec!(100), dec!(10)).unwrap();

        assert_eq!(store.save(&[record]).unwrap(), 1);
        let outcome = store.load().unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].code(), "IN001");
    }

    #[test]
    fn test_save_refuses_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert!(matches!(
            CsvFileStore::new(&path).save(&[]),
            Err(LedgerError::ArgumentError(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_tolerates_bad_lines() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Income_Code,Description,Date,Income_Amount,WHT_Amount,Checksum").unwrap();
        writeln!(file, "IN001,Work,01/01/2025,100,10,20").unwrap();
        writeln!(file, "IN002,Work,31/02/2025,100,10,20").unwrap();

        let outcome = CsvFileStore::new(file.path()).load().unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].line, 3);
    }

    #[test]
    fn test_inspect_counts_lines() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "Line 1\nLine 2\nLine 3").unwrap();
        file.flush().unwrap();

        let report = FileReport::inspect(file.path()).unwrap();
        assert!(report.exists);
        assert!(report.readable);
        assert!(report.size_bytes > 0);
        assert!(report.modified.is_some());
        assert_eq!(report.line_count, 3);
        assert_eq!(report.estimated_records, 2);
        assert!(report.structure.valid);
        assert_eq!(
            report.structure.warnings,
            [
                "File does not appear to be comma-separated",
                "No standard header found"
            ]
        );
    }

    #[test]
    fn test_inspect_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = FileReport::inspect(&dir.path().join("missing.csv")).unwrap();
        assert!(!report.exists);
        assert_eq!(report.line_count, 0);
        assert!(!report.structure.valid);
        assert_eq!(report.structure.errors, ["File does not exist"]);
    }

    #[test]
    fn test_structure_check() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("income.txt");
        fs::write(&txt, "IN001,Work,01/01/2025,100,10,20\n").unwrap();
        assert_eq!(
            check_structure(&txt).unwrap().errors,
            ["File must have .csv extension"]
        );

        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "").unwrap();
        assert_eq!(check_structure(&empty).unwrap().errors, ["File is empty"]);

        // only the first physical line is looked at, even when blank
        let blank_first = dir.path().join("blank.csv");
        fs::write(&blank_first, "\r\nIN001,Work,01/01/2025,100,10,20\n").unwrap();
        let check = check_structure(&blank_first).unwrap();
        assert!(check.valid);
        assert_eq!(check.warnings.len(), 2);

        let headed = dir.path().join("headed.csv");
        fs::write(
            &headed,
            "Income_Code,Description,Date,Income_Amount,WHT_Amount,Checksum\r\n",
        )
        .unwrap();
        let check = check_structure(&headed).unwrap();
        assert!(check.valid);
        assert!(check.errors.is_empty() && check.warnings.is_empty());
        assert_eq!(check.info, ["Valid CSV header detected"]);
    }
}
