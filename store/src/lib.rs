//! Abstract storage for the relay verification bot.
//!
//! The bot persists a handful of wholesale-overwritten records per campaign
//! environment. Every backend (LMDB, in-memory for testing) implements
//! [`KeyValueStore`]; the rest of the codebase depends only on the trait.

pub mod error;
pub mod keys;
pub mod kv;

pub use error::StoreError;
pub use keys::{RecordKey, RecordKind};
pub use kv::KeyValueStore;
