use async_trait::async_trait;
use bytes::Bytes;
use cas_types::Address;

use crate::error::StoreResult;

/// Client for a remote bucket of content-addressed objects.
///
/// All implementations must satisfy these invariants:
/// - `exists` returns `Ok(false)` only for a definite "not found". Any other
///   failure (auth, network) is an error, never "absent".
/// - `put` is safe when the key already exists: an address identifies its
///   content, so overwriting writes identical bytes. It returns only after
///   the backend confirmed the write.
/// - `get` fails with `NotFound` when the key is absent.
/// - `delete` is idempotent: deleting an absent key succeeds.
/// - No local caching; every call reaches the backend.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Check whether an object exists at `address`.
    async fn exists(&self, address: &Address) -> StoreResult<bool>;

    /// Write `data` at `address`.
    async fn put(&self, address: &Address, data: Bytes) -> StoreResult<()>;

    /// Read the object at `address`.
    async fn get(&self, address: &Address) -> StoreResult<Bytes>;

    /// Delete the object at `address`. Absent keys are not an error.
    async fn delete(&self, address: &Address) -> StoreResult<()>;
}

#[async_trait]
impl<T: ObjectStoreClient + ?Sized> ObjectStoreClient for std::sync::Arc<T> {
    async fn exists(&self, address: &Address) -> StoreResult<bool> {
        (**self).exists(address).await
    }

    async fn put(&self, address: &Address, data: Bytes) -> StoreResult<()> {
        (**self).put(address, data).await
    }

    async fn get(&self, address: &Address) -> StoreResult<Bytes> {
        (**self).get(address).await
    }

    async fn delete(&self, address: &Address) -> StoreResult<()> {
        (**self).delete(address).await
    }
}
