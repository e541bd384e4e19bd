use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cas_types::Address;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStoreClient;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are held behind a `RwLock` and
/// keyed by their physical key. The store counts physical writes and can be
/// switched offline or slowed down to exercise failure handling in callers.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Bytes>>,
    puts: AtomicU64,
    deletes: AtomicU64,
    offline: AtomicBool,
    latency_ms: AtomicU64,
    put_latency_ms: AtomicU64,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            puts: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            offline: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            put_latency_ms: AtomicU64::new(0),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Number of physical `put` calls that reached the store.
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `delete` calls that reached the store.
    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Make every operation fail with a transport error until reset.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every operation by `latency` before it touches the map.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Delay only `put` by `latency`, on top of any latency from
    /// [`set_latency`](Self::set_latency).
    pub fn set_put_latency(&self, latency: Duration) {
        self.put_latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Return a sorted list of all keys in the store.
    pub fn all_keys(&self) -> Vec<String> {
        let map = self.objects.read().expect("lock poisoned");
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Overwrite the bytes at `address` without any checks.
    ///
    /// Simulates corruption or tampering in the backing bucket.
    pub fn tamper(&self, address: &Address, data: Bytes) {
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(address.key().to_string(), data);
    }

    async fn enter(&self, op: &'static str, address: &Address) -> StoreResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Transport {
                op,
                key: address.key().to_string(),
                reason: "store is offline".into(),
            });
        }
        Ok(())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStore {
    async fn exists(&self, address: &Address) -> StoreResult<bool> {
        self.enter("exists", address).await?;
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(address.key()))
    }

    async fn put(&self, address: &Address, data: Bytes) -> StoreResult<()> {
        self.enter("put", address).await?;
        let latency = self.put_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut map = self.objects.write().expect("lock poisoned");
        map.insert(address.key().to_string(), data);
        Ok(())
    }

    async fn get(&self, address: &Address) -> StoreResult<Bytes> {
        self.enter("get", address).await?;
        let map = self.objects.read().expect("lock poisoned");
        map.get(address.key())
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: address.key().to_string(),
            })
    }

    async fn delete(&self, address: &Address) -> StoreResult<()> {
        self.enter("delete", address).await?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut map = self.objects.write().expect("lock poisoned");
        map.remove(address.key());
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .field("offline", &self.offline.load(Ordering::SeqCst))
            .finish()
    }
}
