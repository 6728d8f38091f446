//! LMDB environment setup and the key-value implementation.

use std::path::Path;

use async_trait::async_trait;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};

use relaybot_store::{KeyValueStore, RecordKey, StoreError};

use crate::LmdbError;

/// Default LMDB map size: 256 MiB. Ledger records are small JSON documents.
pub const DEFAULT_MAP_SIZE: usize = 256 << 20;

const RECORDS_DB: &str = "records";

/// LMDB-backed record store.
#[derive(Clone)]
pub struct LmdbStore {
    env: Env,
    records: Database<Str, Bytes>,
}

impl LmdbStore {
    /// Open or create an LMDB environment in `dir`.
    pub fn open(dir: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(dir)?;
        // SAFETY: the environment is opened once per process for this directory.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(dir)?
        };
        let mut wtxn = env.write_txn()?;
        let records: Database<Str, Bytes> = env.create_database(&mut wtxn, Some(RECORDS_DB))?;
        wtxn.commit()?;
        tracing::debug!(path = %dir.display(), "opened LMDB record store");
        Ok(Self { env, records })
    }

    fn get_blocking(&self, path: &str) -> Result<Option<Vec<u8>>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let value = self.records.get(&rtxn, path)?.map(|v| v.to_vec());
        Ok(value)
    }

    fn put_blocking(&self, path: &str, value: &[u8]) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.records.put(&mut wtxn, path, value)?;
        wtxn.commit()?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for LmdbStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, StoreError> {
        let store = self.clone();
        let path = key.path();
        tokio::task::spawn_blocking(move || store.get_blocking(&path))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
            .map_err(StoreError::from)
    }

    async fn put(&self, key: &RecordKey, value: Vec<u8>) -> Result<(), StoreError> {
        let store = self.clone();
        let path = key.path();
        tokio::task::spawn_blocking(move || store.put_blocking(&path, &value))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
            .map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_types::Environment;

    fn env(name: &str) -> Environment {
        Environment::parse(name).unwrap()
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("open");
        let key = RecordKey::score(&env("dev"));

        assert_eq!(store.get(&key).await.unwrap(), None);
        assert!(!store.exists(&key).await.unwrap());

        store.put(&key, b"{\"a\":1}".to_vec()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"{\"a\":1}"[..]));
        assert!(store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn put_overwrites_wholesale() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("open");
        let key = RecordKey::state(&env("dev"));

        store.put(&key, b"first-and-longer".to_vec()).await.unwrap();
        store.put(&key, b"second".to_vec()).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"second"[..]));
    }

    #[tokio::test]
    async fn environments_do_not_share_records() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("open");

        store
            .put(&RecordKey::score(&env("old")), b"1".to_vec())
            .await
            .unwrap();
        assert_eq!(store.get(&RecordKey::score(&env("new"))).await.unwrap(), None);
    }

    #[tokio::test]
    async fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let key = RecordKey::participants(&env("dev"));
        {
            let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("open");
            store.put(&key, b"persisted".to_vec()).await.unwrap();
        }
        let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("reopen");
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"persisted"[..]));
    }
}
