use cas_types::{Address, RecordId};
use thiserror::Error;

/// Errors from blob store operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Object store failure, propagated unchanged (`NotFound`, `Transport`,
    /// `Timeout`).
    #[error("store error: {0}")]
    Store(#[from] cas_store::StoreError),

    /// A record references an address that does not resolve to its content.
    /// Signals an earlier unsafe delete or tampering in the bucket.
    #[error("integrity violation at {address}: {reason}")]
    Integrity { address: Address, reason: String },

    /// The metadata collaborator could not answer.
    #[error("metadata error: {0}")]
    Metadata(#[from] cas_refs::MetadataError),

    /// The record holds no address.
    #[error("record {0} has no stored content")]
    MissingAddress(RecordId),

    /// Invalid blob store configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BlobError {
    /// Returns `true` for [`BlobError::Integrity`].
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }
}

pub type BlobResult<T> = Result<T, BlobError>;
