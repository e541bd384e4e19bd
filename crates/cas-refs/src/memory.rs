//! In-memory metadata store for testing and ephemeral use.
//!
//! [`InMemoryMetadataStore`] keeps each record's current address in a
//! `HashMap` protected by a `RwLock`. It implements the full
//! [`MetadataStore`] trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use cas_types::{Address, RecordId};

use crate::error::{MetadataError, Result};
use crate::traits::MetadataStore;

/// An in-memory implementation of [`MetadataStore`].
///
/// Data is lost when the store is dropped. The store can be made unavailable
/// to simulate a metadata backend outage.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<RecordId, Address>>,
    unavailable: AtomicBool,
}

impl InMemoryMetadataStore {
    /// Create a new empty metadata store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of records that currently hold an address.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no record holds an address.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records currently pointing at `address`, sorted.
    pub fn records_with(&self, address: &Address) -> Vec<RecordId> {
        let records = self.records.read().expect("lock poisoned");
        let mut ids: Vec<RecordId> = records
            .iter()
            .filter(|(_, a)| *a == address)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(MetadataError::Backend("metadata store unavailable".into()));
        }
        Ok(())
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> MetadataError {
    MetadataError::Backend(format!("lock poisoned: {e}"))
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get_current_address(&self, record: &RecordId) -> Result<Option<Address>> {
        self.check()?;
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(record).cloned())
    }

    async fn count_records_with_address(&self, address: &Address) -> Result<u64> {
        self.check()?;
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.values().filter(|a| *a == address).count() as u64)
    }

    async fn set_current_address(&self, record: &RecordId, address: Address) -> Result<()> {
        self.check()?;
        let mut records = self.records.write().map_err(poisoned)?;
        records.insert(*record, address);
        Ok(())
    }

    async fn clear_current_address(&self, record: &RecordId) -> Result<Option<Address>> {
        self.check()?;
        let mut records = self.records.write().map_err(poisoned)?;
        Ok(records.remove(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_crypto::ContentAddresser;

    fn addr(content: &[u8]) -> Address {
        ContentAddresser::default().address(content)
    }

    #[tokio::test]
    async fn unknown_record_has_no_address() {
        let store = InMemoryMetadataStore::new();
        assert!(store.get_current_address(&RecordId::new()).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn set_replaces_current_address() {
        let store = InMemoryMetadataStore::new();
        let record = RecordId::new();
        store.set_current_address(&record, addr(b"blob1")).await.unwrap();
        store.set_current_address(&record, addr(b"blob2")).await.unwrap();

        assert_eq!(
            store.get_current_address(&record).await.unwrap(),
            Some(addr(b"blob2"))
        );
        assert_eq!(store.count_records_with_address(&addr(b"blob1")).await.unwrap(), 0);
        assert_eq!(store.count_records_with_address(&addr(b"blob2")).await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn clear_returns_previous_address() {
        let store = InMemoryMetadataStore::new();
        let record = RecordId::new();
        store.set_current_address(&record, addr(b"blob1")).await.unwrap();
        assert_eq!(store.clear_current_address(&record).await.unwrap(), Some(addr(b"blob1")));
        assert_eq!(store.clear_current_address(&record).await.unwrap(), None);
    }

    #[tokio::test]
    async fn records_with_lists_sharers() {
        let store = InMemoryMetadataStore::new();
        let (r1, r2, r3) = (RecordId::new(), RecordId::new(), RecordId::new());
        store.set_current_address(&r1, addr(b"shared")).await.unwrap();
        store.set_current_address(&r2, addr(b"shared")).await.unwrap();
        store.set_current_address(&r3, addr(b"other")).await.unwrap();

        let mut expected = vec![r1, r2];
        expected.sort();
        assert_eq!(store.records_with(&addr(b"shared")), expected);
    }

    #[test]
    fn poisoned_lock_is_not_read_as_empty() {
        use std::panic::{catch_unwind, AssertUnwindSafe};
        use std::sync::Arc;

        let store = Arc::new(InMemoryMetadataStore::new());
        let writer = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = writer.records.write().expect("lock poisoned");
            panic!("writer died holding the lock");
        })
        .join();

        assert!(catch_unwind(AssertUnwindSafe(|| store.len())).is_err());
        assert!(catch_unwind(AssertUnwindSafe(|| store.records_with(&addr(b"x")))).is_err());
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_operation() {
        let store = InMemoryMetadataStore::new();
        let record = RecordId::new();
        store.set_unavailable(true);
        assert!(store.get_current_address(&record).await.is_err());
        assert!(store.count_records_with_address(&addr(b"x")).await.is_err());
        assert!(store.set_current_address(&record, addr(b"x")).await.is_err());
        assert!(store.clear_current_address(&record).await.is_err());

        store.set_unavailable(false);
        assert!(store.get_current_address(&record).await.unwrap().is_none());
    }
}
