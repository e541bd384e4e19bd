//! S3-compatible object store client.

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use bytes::Bytes;
use cas_types::Address;
use tracing::{debug, error, info};

use crate::config::ObjectStoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStoreClient;

/// Object store backed by an S3-compatible bucket.
///
/// Objects are stored under the address key verbatim
/// (`{digest[:N]}/{digest}`), so buckets written by earlier deployments with
/// the same algorithm and shard width are readable as-is.
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    use_encryption: bool,
}

impl S3ObjectStore {
    /// Build a client from configuration.
    ///
    /// Uses static credentials from the config and the SDK's operation
    /// timeout set to `op_timeout_ms`. No request is sent until the first
    /// operation.
    pub async fn connect(config: &ObjectStoreConfig) -> StoreResult<Self> {
        config.validate()?;
        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            encryption = config.use_encryption,
            "initializing S3 object store"
        );

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "cas-store",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(config.op_timeout())
                    .build(),
            )
            .load()
            .await;

        let mut builder = S3ConfigBuilder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint {
            debug!(endpoint = %endpoint, "using custom S3 endpoint");
            // MinIO and most S3-compatible services need path-style requests.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self::from_client(Client::from_conf(builder.build()), config))
    }

    /// Wrap an already-configured SDK client.
    pub fn from_client(client: Client, config: &ObjectStoreConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            use_encryption: config.use_encryption,
        }
    }

    /// The bucket objects are stored in.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Whether writes request server-side encryption.
    pub fn use_encryption(&self) -> bool {
        self.use_encryption
    }
}

fn transport<E: std::error::Error>(op: &'static str, address: &Address, err: E) -> StoreError {
    let reason = DisplayErrorContext(&err).to_string();
    error!(op, key = %address, error = %reason, "S3 request failed");
    StoreError::Transport {
        op,
        key: address.key().to_string(),
        reason,
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStore {
    async fn exists(&self, address: &Address) -> StoreResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(address.key())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_not_found() => Ok(false),
                _ => Err(transport("exists", address, err)),
            },
        }
    }

    async fn put(&self, address: &Address, data: Bytes) -> StoreResult<()> {
        let len = data.len();
        debug!(key = %address, bytes = len, "uploading object");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(address.key())
            .content_length(len as i64)
            .set_server_side_encryption(
                self.use_encryption.then_some(ServerSideEncryption::Aes256),
            )
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| transport("put", address, e))?;

        debug!(key = %address, bytes = len, "object uploaded");
        Ok(())
    }

    async fn get(&self, address: &Address) -> StoreResult<Bytes> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(address.key())
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                return match err.as_service_error() {
                    Some(service) if service.is_no_such_key() => Err(StoreError::NotFound {
                        key: address.key().to_string(),
                    }),
                    _ => Err(transport("get", address, err)),
                };
            }
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| transport("get", address, e))?
            .into_bytes();
        debug!(key = %address, bytes = data.len(), "object downloaded");
        Ok(data)
    }

    async fn delete(&self, address: &Address) -> StoreResult<()> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(address.key())
            .send()
            .await
        {
            Ok(_) => {
                debug!(key = %address, "object deleted");
                Ok(())
            }
            // S3 answers 204 for absent keys; some compatible stores answer 404.
            Err(err) if err.raw_response().map(|r| r.status().as_u16()) == Some(404) => {
                debug!(key = %address, "object already absent");
                Ok(())
            }
            Err(err) => Err(transport("delete", address, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_crypto::ContentAddresser;

    fn local_config() -> ObjectStoreConfig {
        ObjectStoreConfig::from_connection_string(
            "s3://test:test@cas-test?endpoint=http%3A%2F%2F127.0.0.1%3A1&timeout_ms=2000",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn connect_keeps_bucket_and_encryption() {
        let mut config = local_config();
        config.use_encryption = true;
        let store = S3ObjectStore::connect(&config).await.unwrap();
        assert_eq!(store.bucket(), "cas-test");
        assert!(store.use_encryption());
    }

    #[tokio::test]
    async fn connect_rejects_invalid_config() {
        let config = ObjectStoreConfig::default();
        let err = S3ObjectStore::connect(&config).await.unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_not_absent() {
        let store = S3ObjectStore::connect(&local_config()).await.unwrap();
        let address = ContentAddresser::default().address(b"blob1");

        let err = store.exists(&address).await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err}");
        assert!(!err.is_not_found());

        let err = store.get(&address).await.unwrap_err();
        assert!(!err.is_not_found());
    }
}
