//! Nullable store: thread-safe in-memory key-value storage for testing.

use async_trait::async_trait;
use relaybot_store::{KeyValueStore, RecordKey, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// An in-memory [`KeyValueStore`] with switchable write failures.
#[derive(Default)]
pub struct NullStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    next_write_delay: Mutex<Option<Duration>>,
    writes: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold the next `put` back for `delay` before it stores anything.
    pub fn delay_next_write(&self, delay: Duration) {
        *self.next_write_delay.lock().unwrap() = Some(delay);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Raw bytes of a record, for assertions.
    pub fn raw(&self, key: &RecordKey) -> Option<Vec<u8>> {
        self.records.lock().unwrap().get(&key.path()).cloned()
    }

    /// Seed a record directly, bypassing failure injection.
    pub fn insert_raw(&self, key: &RecordKey, value: impl Into<Vec<u8>>) {
        self.records
            .lock()
            .unwrap()
            .insert(key.path(), value.into());
    }
}

#[async_trait]
impl KeyValueStore for NullStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.records.lock().unwrap().get(&key.path()).cloned())
    }

    async fn put(&self, key: &RecordKey, value: Vec<u8>) -> Result<(), StoreError> {
        let delay = self.next_write_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!("injected write failure for {key}")));
        }
        self.records.lock().unwrap().insert(key.path(), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
