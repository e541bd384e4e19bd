use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Connection settings for an S3-compatible bucket.
///
/// Works with AWS S3 and S3-compatible providers (MinIO, DigitalOcean
/// Spaces, ...). When `endpoint` is set, requests use path-style addressing
/// against that endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStoreConfig {
    /// Custom endpoint URL, e.g. `http://localhost:9000`. `None` targets AWS.
    pub endpoint: Option<String>,
    /// Signing region.
    pub region: String,
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Bucket name.
    pub bucket: String,
    /// Request server-side encryption (AES256) on every write.
    pub use_encryption: bool,
    /// Per-operation deadline in milliseconds.
    pub op_timeout_ms: u64,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key: String::new(),
            secret_key: String::new(),
            bucket: String::new(),
            use_encryption: false,
            op_timeout_ms: 30_000,
        }
    }
}

impl ObjectStoreConfig {
    /// Load from a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a single-string location of the form
    /// `s3://ACCESS_KEY:SECRET_KEY@BUCKET[?endpoint=URL&region=R&encrypt=true&timeout_ms=N]`.
    ///
    /// Credentials and query values are percent-decoded.
    pub fn from_connection_string(s: &str) -> StoreResult<Self> {
        let rest = s
            .get(..5)
            .filter(|scheme| scheme.eq_ignore_ascii_case("s3://"))
            .map(|_| &s[5..])
            .ok_or_else(|| StoreError::Config("location must start with s3://".into()))?;

        let (authority, query) = match rest.split_once('?') {
            Some((a, q)) => (a, Some(q)),
            None => (rest, None),
        };
        let (credentials, bucket) = authority
            .rsplit_once('@')
            .ok_or_else(|| StoreError::Config("missing credentials before '@'".into()))?;
        let (access_key, secret_key) = credentials
            .split_once(':')
            .ok_or_else(|| StoreError::Config("credentials must be ACCESS:SECRET".into()))?;

        let mut config = Self {
            access_key: decode(access_key)?,
            secret_key: decode(secret_key)?,
            bucket: bucket.trim_end_matches('/').to_string(),
            ..Self::default()
        };

        for pair in query.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode(value)?;
            match name {
                "endpoint" => config.endpoint = Some(value),
                "region" => config.region = value,
                "encrypt" | "sse" => config.use_encryption = parse_flag(name, &value)?,
                "timeout_ms" => {
                    config.op_timeout_ms = value
                        .parse()
                        .map_err(|_| StoreError::Config(format!("invalid timeout_ms: {value}")))?
                }
                other => {
                    return Err(StoreError::Config(format!("unknown parameter: {other}")));
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot reach a bucket.
    pub fn validate(&self) -> StoreResult<()> {
        if self.bucket.trim().is_empty() {
            return Err(StoreError::Config("bucket must not be empty".into()));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(StoreError::Config("access key and secret key are required".into()));
        }
        if self.region.trim().is_empty() {
            return Err(StoreError::Config("region must not be empty".into()));
        }
        if self.op_timeout_ms == 0 {
            return Err(StoreError::Config("op_timeout_ms must be greater than zero".into()));
        }
        Ok(())
    }

    /// The per-operation deadline.
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

fn decode(s: &str) -> StoreResult<String> {
    urlencoding::decode(s)
        .map(|v| v.into_owned())
        .map_err(|e| StoreError::Config(format!("invalid percent-encoding: {e}")))
}

fn parse_flag(name: &str, value: &str) -> StoreResult<bool> {
    match value {
        "" | "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(StoreError::Config(format!("invalid value for {name}: {other}"))),
    }
}

impl fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("use_encryption", &self.use_encryption)
            .field("op_timeout_ms", &self.op_timeout_ms)
            .finish()
    }
}
