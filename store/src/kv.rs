//! Async key-value storage trait.

use async_trait::async_trait;

use crate::{RecordKey, StoreError};

/// A minimal async key-value store.
///
/// Values are opaque bytes; callers own the encoding. Writes replace the
/// previous value wholesale, which is the only update pattern the ledger uses.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a record, `None` if it was never written.
    async fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write (or overwrite) a record.
    async fn put(&self, key: &RecordKey, value: Vec<u8>) -> Result<(), StoreError>;

    /// Whether a record exists.
    async fn exists(&self, key: &RecordKey) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}
