//! Error types for the data-loader crate.

use thiserror::Error;

/// Errors that can occur while loading a catalog snapshot
///
/// Malformed individual records are not errors: the parser skips them and
/// logs a warning. These variants cover failures of the snapshot as a whole.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The snapshot is not valid JSON or does not have the expected shape
    #[error("Failed to decode catalog: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
