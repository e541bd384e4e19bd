//! Reference tracking for content-addressed blobs.
//!
//! Remote object stores offer no atomic reference counts. Whether a stored
//! object may be deleted is instead derived from the records that point at
//! it, which live in an external metadata store.
//!
//! # Modules
//!
//! - [`error`] — Error types for metadata operations
//! - [`traits`] — The [`MetadataStore`] trait, implemented by whatever owns records
//! - [`tracker`] — [`ReferenceTracker`], the liveness check used before deletes
//! - [`memory`] — In-memory [`InMemoryMetadataStore`] for tests

pub mod error;
pub mod memory;
pub mod tracker;
pub mod traits;

pub use error::{MetadataError, Result};
pub use memory::InMemoryMetadataStore;
pub use tracker::ReferenceTracker;
pub use traits::MetadataStore;
