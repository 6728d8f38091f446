//! One-time score restore from another campaign environment.
//!
//! When a campaign moves to a new environment, participants verified in the
//! previous one carry over with a fixed bonus; their old amounts are
//! discarded. The restore runs at most once per process and never touches a
//! destination that already has scores.

use std::collections::BTreeMap;
use std::sync::Arc;

use relaybot_store::{KeyValueStore, RecordKey};
use relaybot_types::Environment;
use tokio::sync::OnceCell;

use crate::LedgerError;

/// What a restore did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No source environment configured.
    NotConfigured,
    /// The destination already has a score record.
    DestinationExists,
    /// The source has no scores.
    SourceEmpty,
    Restored { participants: usize },
}

/// Init-once score restore.
pub struct ScoreRestore {
    store: Arc<dyn KeyValueStore>,
    source: Option<String>,
    destination: Environment,
    bonus: u64,
    outcome: OnceCell<RestoreOutcome>,
}

impl ScoreRestore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        source: Option<String>,
        destination: Environment,
        bonus: u64,
    ) -> Self {
        Self {
            store,
            source,
            destination,
            bonus,
            outcome: OnceCell::new(),
        }
    }

    /// Run the restore. Later calls return the first outcome without
    /// touching storage again.
    pub async fn run(&self) -> Result<RestoreOutcome, LedgerError> {
        self.outcome
            .get_or_try_init(|| self.restore())
            .await
            .copied()
    }

    async fn restore(&self) -> Result<RestoreOutcome, LedgerError> {
        let Some(raw) = self.source.as_deref() else {
            return Ok(RestoreOutcome::NotConfigured);
        };
        let source = Environment::parse(raw)
            .map_err(|_| LedgerError::InvalidSourceEnvironment(raw.to_string()))?;
        if source == self.destination {
            return Err(LedgerError::InvalidSourceEnvironment(format!(
                "{raw} is the destination environment"
            )));
        }

        let destination_key = RecordKey::score(&self.destination);
        if self.store.exists(&destination_key).await? {
            tracing::info!(
                source = %source,
                destination = %self.destination,
                "destination scores exist, skipping restore"
            );
            return Ok(RestoreOutcome::DestinationExists);
        }

        let source_key = RecordKey::score(&source);
        let scores: BTreeMap<String, u64> = match self.store.get(&source_key).await? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| LedgerError::Serialization {
                    record: source_key.path(),
                    source,
                })?
            }
            None => BTreeMap::new(),
        };
        if scores.is_empty() {
            tracing::info!(source = %source, "no scores to restore");
            return Ok(RestoreOutcome::SourceEmpty);
        }

        let restored: BTreeMap<String, u64> =
            scores.into_keys().map(|id| (id, self.bonus)).collect();
        let participants = restored.len();
        let bytes = serde_json::to_vec(&restored).map_err(|source| LedgerError::Serialization {
            record: destination_key.path(),
            source,
        })?;
        self.store.put(&destination_key, bytes).await?;

        tracing::info!(
            source = %source,
            destination = %self.destination,
            participants,
            bonus = self.bonus,
            "scores restored"
        );
        Ok(RestoreOutcome::Restored { participants })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_nullables::{test_peer, NullStore};

    fn dest() -> Environment {
        Environment::parse("saentis").unwrap()
    }

    fn restore(store: &Arc<NullStore>, source: Option<&str>) -> ScoreRestore {
        ScoreRestore::new(store.clone(), source.map(str::to_string), dest(), 10)
    }

    fn seed_source(store: &NullStore) {
        let raw = format!(r#"{{"{}":3,"{}":250}}"#, test_peer(1), test_peer(2));
        store.insert_raw(&RecordKey::score(&Environment::parse("basodino").unwrap()), raw);
    }

    #[tokio::test]
    async fn restores_ids_with_bonus() {
        let store = Arc::new(NullStore::new());
        seed_source(&store);

        let outcome = restore(&store, Some("basodino")).run().await.unwrap();

        assert_eq!(outcome, RestoreOutcome::Restored { participants: 2 });
        let raw = store.raw(&RecordKey::score(&dest())).unwrap();
        let scores: BTreeMap<String, u64> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(scores[test_peer(1).as_str()], 10);
        assert_eq!(scores[test_peer(2).as_str()], 10);
    }

    #[tokio::test]
    async fn existing_destination_is_left_alone() {
        let store = Arc::new(NullStore::new());
        seed_source(&store);
        store.insert_raw(&RecordKey::score(&dest()), "{}");

        let outcome = restore(&store, Some("basodino")).run().await.unwrap();

        assert_eq!(outcome, RestoreOutcome::DestinationExists);
        assert_eq!(store.raw(&RecordKey::score(&dest())).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn missing_or_empty_source_is_a_no_op() {
        let store = Arc::new(NullStore::new());
        assert_eq!(
            restore(&store, Some("basodino")).run().await.unwrap(),
            RestoreOutcome::SourceEmpty
        );
        assert_eq!(
            restore(&store, None).run().await.unwrap(),
            RestoreOutcome::NotConfigured
        );
        assert!(store.raw(&RecordKey::score(&dest())).is_none());
    }

    #[tokio::test]
    async fn invalid_source_name_is_fatal() {
        let store = Arc::new(NullStore::new());
        assert!(matches!(
            restore(&store, Some("Not A Name!")).run().await,
            Err(LedgerError::InvalidSourceEnvironment(_))
        ));
        assert!(matches!(
            restore(&store, Some("saentis")).run().await,
            Err(LedgerError::InvalidSourceEnvironment(_))
        ));
    }

    #[tokio::test]
    async fn runs_only_once() {
        let store = Arc::new(NullStore::new());
        seed_source(&store);
        let once = restore(&store, Some("basodino"));

        assert!(matches!(once.run().await.unwrap(), RestoreOutcome::Restored { .. }));
        let writes = store.write_count();
        assert!(matches!(once.run().await.unwrap(), RestoreOutcome::Restored { .. }));
        assert_eq!(store.write_count(), writes);
    }
}
