//! Deduplicating blob storage over remote object stores.
//!
//! [`BlobStore`] is the main entry point. It stores each distinct payload
//! once, under an address derived from its content, and deletes an object
//! only after no logical record references it anymore.
//!
//! ```text
//! attach(record, bytes) ──► store ──► metadata.set_current_address
//!                                              │
//! detach(record) ──► metadata.clear ──► release ──► count refs ──► delete / queue
//!                                                                      │
//!                                                   gc_sweep ◄─────────┘
//! ```
//!
//! Records and their current addresses live in an external
//! [`cas_refs::MetadataStore`]; bytes live in any
//! [`cas_store::ObjectStoreClient`].

pub mod config;
pub mod error;
mod locks;
mod queue;
pub mod store;

pub use config::{BlobStoreConfig, DeletePolicy};
pub use error::{BlobError, BlobResult};
pub use queue::{PendingDelete, PendingReason};
pub use store::{BlobStore, ReleaseOutcome, SweepReport};

// Re-export key types
pub use cas_types::{Address, HashAlgorithm, RecordId};
