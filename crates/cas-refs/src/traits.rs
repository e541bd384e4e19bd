//! The [`MetadataStore`] trait: the interface to whatever owns logical
//! records.
//!
//! The blob layer never reads record names, mime types, or access rules. It
//! only needs each record's current address and how many records share an
//! address.

use async_trait::async_trait;
use cas_types::{Address, RecordId};

use crate::error::Result;

/// Storage of logical records, as seen by the blob layer.
///
/// Each record holds at most one current [`Address`]. Many records may hold
/// the same address; that sharing is what reference counting is derived
/// from, since the object store itself has no reference counts.
///
/// Implementations must be thread-safe and answer from current state.
/// `count_records_with_address` in particular must not be served from a
/// cache: records change independently of the blob layer.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// The record's current address, or `None` if it has none (or the record
    /// is unknown).
    async fn get_current_address(&self, record: &RecordId) -> Result<Option<Address>>;

    /// Number of records whose current address equals `address`.
    async fn count_records_with_address(&self, address: &Address) -> Result<u64>;

    /// Point the record at `address`, creating the record if needed.
    async fn set_current_address(&self, record: &RecordId, address: Address) -> Result<()>;

    /// Remove the record's address, returning the one it held.
    async fn clear_current_address(&self, record: &RecordId) -> Result<Option<Address>>;
}
