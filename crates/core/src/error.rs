//! Error types for the Kindred matching engine.
//!
//! This module defines a unified error enum covering all error categories
//! in the system: configuration, upstream provider failures, vector index
//! failures, synthesis failures, and access control.

use thiserror::Error;

/// Unified error type for Kindred.
///
/// All functions in the workspace return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated. Entry
/// points (CLI, HTTP) are responsible for mapping these variants to exit
/// codes or status codes; the engine itself never deals in wire codes.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors (missing credentials, bad settings).
    /// Fatal at startup: abort instead of retrying.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream embedding/text-generation transport failure
    /// (timeout, auth, rate limit). Retryable with backoff.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The provider returned a vector of the wrong length.
    /// Signals model/config drift, not a transient fault. Never retried.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Narrative/ideal-match synthesis failure. Retryable.
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Vector index operation failure. Retryable.
    #[error("Index error: {0}")]
    Index(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller identity is missing
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller identity does not own the requested record
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Whether a caller may retry the failed operation with backoff.
    ///
    /// Only transient upstream faults qualify; configuration problems,
    /// dimension drift and access-control failures never do.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Provider(_) | AppError::Synthesis(_) | AppError::Index(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
