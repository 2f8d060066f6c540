//! Error types for the tree indexes

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

/// Error types that can occur while building, mutating or querying an index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Dimension exceeds the maximum dimension: max {max}, got {actual}")]
    DimensionExceeded { max: usize, actual: usize },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index {index} out of range (rows={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid vector: {reason}")]
    InvalidVector { reason: String },

    #[error("Malformed row at {path}:{line}: {reason}")]
    MalformedRow {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Store {path} is read-only: its lines do not match the loaded rows")]
    StoreReadOnly { path: PathBuf },

    #[error("Failed to write store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Config error: {0}")]
    ConfigError(String),
}
