//! LMDB storage backend for the relay verification bot.
//!
//! Implements [`relaybot_store::KeyValueStore`] on top of a single named LMDB
//! database using the `heed` bindings. LMDB calls are blocking, so every
//! operation runs on tokio's blocking pool.

pub mod environment;
pub mod error;

pub use environment::LmdbStore;
pub use error::LmdbError;
