//! Error types for metadata and reference operations.

use thiserror::Error;

/// Errors raised by a metadata collaborator.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The metadata backend could not answer (connection, transaction, or
    /// lock failure). Callers must not interpret this as "no references".
    #[error("metadata backend error: {0}")]
    Backend(String),
}

/// Convenience type alias for metadata operations.
pub type Result<T> = std::result::Result<T, MetadataError>;
