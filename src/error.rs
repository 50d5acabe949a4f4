//! Error types for pipegrid
//!
//! Clear error messages with actionable guidance.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// pipegrid error types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument or configuration value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation attempted in a state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A required external file or column is missing
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// Array dimensions do not line up
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected shape description
        expected: String,
        /// Actual shape description
        actual: String,
    },

    /// Predict or transform called before fit
    #[error("Model not fitted: call fit() before {0}")]
    NotFitted(String),

    /// Numerical failure during fitting (singular system, empty fold, ...)
    #[error("Computation failed: {0}")]
    Computation(String),

    /// Error raised by the underlying estimator library
    #[error("Model error: {0}")]
    Model(#[from] aprender::AprenderError),

    /// Result store error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
