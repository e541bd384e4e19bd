use std::time::Duration;

use cas_crypto::{ContentAddresser, DEFAULT_SHARD_WIDTH};
use cas_types::HashAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::{BlobError, BlobResult};

/// How released addresses are physically deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Delete during `release`, under the address lock, right after the
    /// reference count came back zero.
    #[default]
    Immediate,
    /// Queue zero-reference addresses; `gc_sweep` deletes them once
    /// `grace_ms` has passed and a fresh count is still zero.
    Deferred { grace_ms: u64 },
}

impl DeletePolicy {
    /// Minimum time an address waits in the queue before a sweep may delete
    /// it.
    pub fn grace(&self) -> Duration {
        match self {
            Self::Immediate => Duration::ZERO,
            Self::Deferred { grace_ms } => Duration::from_millis(*grace_ms),
        }
    }
}

/// Blob store configuration.
///
/// `algorithm` and `shard_width` define the address format of every object
/// in the bucket and must not change for a deployment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobStoreConfig {
    pub algorithm: HashAlgorithm,
    pub shard_width: usize,
    pub delete_policy: DeletePolicy,
    /// Re-hash fetched bytes and fail with an integrity error on mismatch.
    pub verify_reads: bool,
    /// Deadline for each object store operation.
    pub op_timeout_ms: u64,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha1,
            shard_width: DEFAULT_SHARD_WIDTH,
            delete_policy: DeletePolicy::Immediate,
            verify_reads: false,
            op_timeout_ms: 30_000,
        }
    }
}

impl BlobStoreConfig {
    /// Load from a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> BlobResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| BlobError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration and build the addresser it describes.
    pub fn addresser(&self) -> BlobResult<ContentAddresser> {
        ContentAddresser::new(self.algorithm, self.shard_width)
            .map_err(|e| BlobError::Config(e.to_string()))
    }

    /// Reject unusable configurations.
    pub fn validate(&self) -> BlobResult<()> {
        self.addresser()?;
        if self.op_timeout_ms == 0 {
            return Err(BlobError::Config("op_timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }

    /// Deadline for each object store operation.
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}
