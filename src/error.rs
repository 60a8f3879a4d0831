//! Error types shared by the index, catalog, and service layers.

use thiserror::Error;

/// Errors surfaced by vector index implementations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    /// The query or stored vector dimension did not match the index's fixed dimension.
    #[error("dimension mismatch: index expects {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Top-level error type for catalog, service, and HTTP operations.
#[derive(Debug, Error)]
pub enum VectraError {
    /// The requested library, document, or chunk does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation conflicts with existing state (e.g. duplicate library name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A vector's dimension did not match the dimension fixed for its index.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The embedding collaborator failed or returned an invalid response.
    #[error("embedding provider error: {0}")]
    Upstream(String),

    /// Invalid configuration was supplied (bad config token, missing API key, etc).
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<IndexError> for VectraError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DimensionMismatch { expected, actual } => VectraError::DimensionMismatch(
                format!("expected {expected} dimensions, got {actual}"),
            ),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VectraError>;
