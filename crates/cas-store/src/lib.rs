//! Object store clients for content-addressed blobs.
//!
//! Every backend implements [`ObjectStoreClient`], a four-operation view of a
//! remote bucket: `exists`, `put`, `get`, `delete`. Keys are
//! [`cas_types::Address`]es, stored under their physical key form.
//!
//! # Backends
//!
//! - [`S3ObjectStore`] -- AWS S3 and S3-compatible services
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`TimeoutObjectStore`] -- wraps any backend with per-operation deadlines
//!
//! # Rules
//!
//! 1. "Not found" and transport failures are distinct errors. A failure is
//!    never reported as an absent object.
//! 2. `put` is idempotent: an address names its content.
//! 3. `delete` is idempotent: deleting an absent key succeeds.
//! 4. A timed-out operation is failed, never assumed to have succeeded.

pub mod config;
pub mod error;
pub mod memory;
pub mod s3;
pub mod timeout;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::ObjectStoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use s3::S3ObjectStore;
pub use timeout::TimeoutObjectStore;
pub use traits::ObjectStoreClient;
