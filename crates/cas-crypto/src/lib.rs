//! Content addressing for blob storage.
//!
//! [`ContentAddresser`] turns payload bytes into a sharded [`cas_types::Address`]
//! using SHA-1, SHA-256, or BLAKE3. Hashing wraps established libraries; no
//! custom cryptography.

pub mod addresser;

pub use addresser::{AddresserError, ContentAddresser, DEFAULT_SHARD_WIDTH};
