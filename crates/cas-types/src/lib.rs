//! Foundation types for content-addressed blob storage.
//!
//! Every other crate in the workspace depends on `cas-types`.
//!
//! # Key Types
//!
//! - [`Address`] — Sharded content address, `{digest[:N]}/{digest}`
//! - [`HashAlgorithm`] — Hash function fixed for the life of a deployment
//! - [`RecordId`] — Identifier of a logical record owned by the metadata store

pub mod address;
pub mod algorithm;
pub mod error;
pub mod record;

pub use address::Address;
pub use algorithm::HashAlgorithm;
pub use error::TypeError;
pub use record::RecordId;
