/// Errors from object store operations.
///
/// `NotFound` and `Transport` are kept strictly apart: a backend that cannot
/// be reached must never be reported as holding no object.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested key does not exist in the bucket.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// Network, authentication, or backend failure.
    #[error("{op} {key} failed: {reason}")]
    Transport {
        op: &'static str,
        key: String,
        reason: String,
    },

    /// The operation did not complete within its deadline. Its outcome is
    /// unknown and it is treated as failed.
    #[error("{op} {key} timed out after {after_ms}ms")]
    Timeout {
        op: &'static str,
        key: String,
        after_ms: u64,
    },

    /// Invalid client configuration.
    #[error("invalid object store configuration: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for failures whose outcome is unknown and may succeed
    /// on retry (transport errors and timeouts).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let nf = StoreError::NotFound { key: "ab/abcd".into() };
        assert!(nf.is_not_found());
        assert!(!nf.is_retryable());

        let tr = StoreError::Transport {
            op: "get",
            key: "ab/abcd".into(),
            reason: "connection reset".into(),
        };
        assert!(!tr.is_not_found());
        assert!(tr.is_retryable());

        let to = StoreError::Timeout { op: "put", key: "ab/abcd".into(), after_ms: 50 };
        assert!(to.is_retryable());
        assert!(!StoreError::Config("x".into()).is_retryable());
    }

    #[test]
    fn display_includes_operation() {
        let err = StoreError::Timeout { op: "put", key: "ab/abcd".into(), after_ms: 50 };
        assert_eq!(err.to_string(), "put ab/abcd timed out after 50ms");
    }
}
