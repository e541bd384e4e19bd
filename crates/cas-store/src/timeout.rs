use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cas_types::Address;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStoreClient;

/// Bounds every operation of an inner client with a deadline.
///
/// An operation that misses its deadline fails with
/// [`StoreError::Timeout`]. For `put` this means the write is unconfirmed and
/// must be treated as failed, even if the backend later completes it.
#[derive(Debug)]
pub struct TimeoutObjectStore<C> {
    inner: C,
    timeout: Duration,
}

impl<C: ObjectStoreClient> TimeoutObjectStore<C> {
    /// Wrap `inner` so each operation is bounded by `timeout`.
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// The per-operation deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        address: &Address,
        fut: impl Future<Output = StoreResult<T>> + Send,
    ) -> StoreResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, key = %address, timeout_ms = self.timeout.as_millis() as u64, "object store operation timed out");
                Err(StoreError::Timeout {
                    op,
                    key: address.key().to_string(),
                    after_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[async_trait]
impl<C: ObjectStoreClient> ObjectStoreClient for TimeoutObjectStore<C> {
    async fn exists(&self, address: &Address) -> StoreResult<bool> {
        self.bounded("exists", address, self.inner.exists(address)).await
    }

    async fn put(&self, address: &Address, data: Bytes) -> StoreResult<()> {
        self.bounded("put", address, self.inner.put(address, data)).await
    }

    async fn get(&self, address: &Address) -> StoreResult<Bytes> {
        self.bounded("get", address, self.inner.get(address)).await
    }

    async fn delete(&self, address: &Address) -> StoreResult<()> {
        self.bounded("delete", address, self.inner.delete(address)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryObjectStore;
    use cas_crypto::ContentAddresser;

    fn addr(content: &[u8]) -> Address {
        ContentAddresser::default().address(content)
    }

    #[tokio::test]
    async fn fast_operations_pass_through() {
        let store = TimeoutObjectStore::new(InMemoryObjectStore::new(), Duration::from_secs(5));
        let a = addr(b"fast");
        store.put(&a, Bytes::from_static(b"fast")).await.unwrap();
        assert!(store.exists(&a).await.unwrap());
        assert_eq!(store.get(&a).await.unwrap(), Bytes::from_static(b"fast"));
        store.delete(&a).await.unwrap();
        assert!(store.get(&a).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn slow_put_is_a_timeout_not_a_success() {
        let inner = InMemoryObjectStore::new();
        inner.set_latency(Duration::from_millis(500));
        let store = TimeoutObjectStore::new(inner, Duration::from_millis(20));
        let a = addr(b"slow");

        let err = store.put(&a, Bytes::from_static(b"slow")).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout { op: "put", after_ms: 20, .. }));
        // The inner future was dropped before it reached the map.
        assert_eq!(store.inner().put_count(), 0);
    }

    #[tokio::test]
    async fn slow_exists_is_an_error_not_absent() {
        let inner = InMemoryObjectStore::new();
        inner.set_latency(Duration::from_millis(500));
        let store = TimeoutObjectStore::new(inner, Duration::from_millis(20));
        let err = store.exists(&addr(b"slow")).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn inner_errors_are_not_rewritten() {
        let inner = InMemoryObjectStore::new();
        inner.set_offline(true);
        let store = TimeoutObjectStore::new(inner, Duration::from_secs(5));
        let err = store.get(&addr(b"x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport { .. }));
    }
}
