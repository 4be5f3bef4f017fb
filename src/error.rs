//! Error types for macro-regimes
//!
//! Only structural failures are errors. Per-record gaps, thin samples and
//! skipped tests travel through the data model as undefined values instead.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for macro-regimes
#[derive(Error, Debug)]
pub enum RegimeError {
    #[error("Required column missing from panel: {0}")]
    MissingColumn(String),

    #[error("Duplicate month in panel: {0}")]
    DuplicateDate(NaiveDate),

    #[error("Column '{column}' has {actual} values, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Panel has no rows")]
    EmptyPanel,

    #[error("Series store returned no observations for {0}")]
    EmptySeries(String),

    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for macro-regimes operations
pub type Result<T> = std::result::Result<T, RegimeError>;
