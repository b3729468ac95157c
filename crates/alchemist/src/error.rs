//! Error types for the Alchemist library.
//!
//! Data problems (missing columns, bad cells, dangling rule references) are
//! never errors in this sense: they are reported through
//! [`ValidationReport`](crate::validation::ValidationReport) and rule problem
//! lists. `AlchemistError` covers failures of the surrounding plumbing.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Alchemist operations.
#[derive(Debug, Error)]
pub enum AlchemistError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no rows to ingest.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The advisory collaborator failed or answered with something unusable.
    #[error("Advisor error: {0}")]
    Advisor(String),

    /// A pending mapping id that the session does not know about.
    #[error("No pending mapping with id {0}")]
    UnknownPending(usize),

    /// A cell edit addressed a row that does not exist.
    #[error("Row {row} out of range for {entity} ({len} rows)")]
    RowOutOfRange {
        entity: String,
        row: usize,
        len: usize,
    },

    /// A cell edit was refused because it breaks a rule.
    #[error("Edit rejected: {0}")]
    EditRejected(String),

    /// Rules cannot be applied until the listed problems are fixed.
    #[error("Invalid rules: {}", .0.join("; "))]
    InvalidRules(Vec<String>),

    /// Export refused until the listed problems are fixed.
    #[error("Export blocked: {}", .0.join("; "))]
    ExportBlocked(Vec<String>),
}

/// Result type alias for Alchemist operations.
pub type Result<T> = std::result::Result<T, AlchemistError>;
