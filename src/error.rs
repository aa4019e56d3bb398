use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Format error: {0}")]
    FormatError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Argument error: {0}")]
    ArgumentError(String),
    #[error("Self-test failed: {0}")]
    SelfTestError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
