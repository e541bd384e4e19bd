use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid address {key:?}: {reason}")]
    InvalidAddress { key: String, reason: String },

    #[error("hash algorithm must not be empty")]
    EmptyAlgorithm,

    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),
}
