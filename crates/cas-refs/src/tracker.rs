//! Liveness checks for stored objects.

use std::sync::Arc;

use cas_types::Address;
use tracing::debug;

use crate::error::Result;
use crate::traits::MetadataStore;

/// Derives whether an address is still referenced by any logical record.
///
/// Every call queries the metadata store; nothing is cached. A backend error
/// propagates, so a failed count never reads as "zero references".
#[derive(Debug)]
pub struct ReferenceTracker<M> {
    metadata: Arc<M>,
}

impl<M> Clone for ReferenceTracker<M> {
    fn clone(&self) -> Self {
        Self {
            metadata: Arc::clone(&self.metadata),
        }
    }
}

impl<M: MetadataStore> ReferenceTracker<M> {
    /// Create a tracker over a metadata store.
    pub fn new(metadata: Arc<M>) -> Self {
        Self { metadata }
    }

    /// The metadata store this tracker queries.
    pub fn metadata(&self) -> &Arc<M> {
        &self.metadata
    }

    /// Number of records whose current address is `address`.
    pub async fn count_references(&self, address: &Address) -> Result<u64> {
        let count = self.metadata.count_records_with_address(address).await?;
        debug!(address = %address, references = count, "counted references");
        Ok(count)
    }

    /// `true` iff no record references `address`.
    pub async fn is_safe_to_delete(&self, address: &Address) -> Result<bool> {
        Ok(self.count_references(address).await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMetadataStore;
    use cas_crypto::ContentAddresser;
    use cas_types::RecordId;

    fn addr(content: &[u8]) -> Address {
        ContentAddresser::default().address(content)
    }

    #[tokio::test]
    async fn unreferenced_address_is_safe() {
        let tracker = ReferenceTracker::new(Arc::new(InMemoryMetadataStore::new()));
        let a = addr(b"orphan");
        assert_eq!(tracker.count_references(&a).await.unwrap(), 0);
        assert!(tracker.is_safe_to_delete(&a).await.unwrap());
    }

    #[tokio::test]
    async fn shared_address_counts_every_record() {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let tracker = ReferenceTracker::new(Arc::clone(&metadata));
        let a = addr(b"blob1");
        let (r1, r2) = (RecordId::new(), RecordId::new());
        metadata.set_current_address(&r1, a.clone()).await.unwrap();
        metadata.set_current_address(&r2, a.clone()).await.unwrap();

        assert_eq!(tracker.count_references(&a).await.unwrap(), 2);
        assert!(!tracker.is_safe_to_delete(&a).await.unwrap());

        metadata.clear_current_address(&r1).await.unwrap();
        assert_eq!(tracker.count_references(&a).await.unwrap(), 1);
        assert!(!tracker.is_safe_to_delete(&a).await.unwrap());

        metadata.clear_current_address(&r2).await.unwrap();
        assert!(tracker.is_safe_to_delete(&a).await.unwrap());
    }

    #[tokio::test]
    async fn counts_reflect_changes_made_after_construction() {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let tracker = ReferenceTracker::new(Arc::clone(&metadata));
        let a = addr(b"late");
        assert!(tracker.is_safe_to_delete(&a).await.unwrap());
        metadata.set_current_address(&RecordId::new(), a.clone()).await.unwrap();
        assert!(!tracker.is_safe_to_delete(&a).await.unwrap());
    }

    #[tokio::test]
    async fn backend_failure_is_not_zero() {
        let metadata = Arc::new(InMemoryMetadataStore::new());
        let tracker = ReferenceTracker::new(Arc::clone(&metadata));
        metadata.set_unavailable(true);
        assert!(tracker.is_safe_to_delete(&addr(b"x")).await.is_err());
    }
}
