//! Error types for the dataview core.

use thiserror::Error;

/// Errors that can occur in the dataview engine
#[derive(Error, Debug)]
pub enum DataviewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("No column named {0:?}")]
    UnknownColumn(String),

    #[error("Column {0:?} already exists")]
    DuplicateColumn(String),

    #[error("Row {0} is out of range")]
    RowOutOfRange(usize),

    #[error("File contains no data")]
    EmptyInput,

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, DataviewError>;
