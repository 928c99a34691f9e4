//! Error types for Subly

use thiserror::Error;

/// File-level failures. Any of these aborts the whole upload.
#[derive(Error, Debug)]
pub enum Error {
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid rules config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Row-level failures. The row is skipped and the import continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("empty description")]
    EmptyDescription,

    #[error("empty name")]
    EmptyName,

    #[error("unable to parse amount: {0:?}")]
    InvalidAmount(String),

    #[error("unable to parse date: {0:?}")]
    InvalidDate(String),
}
