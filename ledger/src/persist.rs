//! Reading and writing ledger records.

use std::collections::BTreeMap;
use std::sync::Arc;

use relaybot_store::{KeyValueStore, RecordKey};
use relaybot_types::{Environment, PeerAddress};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::participant::Participant;
use crate::snapshot::{LedgerSnapshot, StateRecord};
use crate::LedgerError;

/// Ledger records of one campaign environment.
///
/// Three records are kept, each overwritten wholesale on every snapshot:
/// `score` (address → score), `state` (chain metadata) and `participants`
/// (address → participant).
pub struct LedgerStore {
    store: Arc<dyn KeyValueStore>,
    environment: Environment,
}

impl LedgerStore {
    pub fn new(store: Arc<dyn KeyValueStore>, environment: Environment) -> Self {
        Self { store, environment }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Load every participant.
    ///
    /// Score entries without a participant record become unverified
    /// participants carrying that score; this is how restored scores appear.
    pub async fn load(&self) -> Result<Vec<Participant>, LedgerError> {
        let mut participants: BTreeMap<PeerAddress, Participant> = self
            .read(&RecordKey::participants(&self.environment))
            .await?
            .unwrap_or_default();
        let scores: BTreeMap<String, u64> = self
            .read(&RecordKey::score(&self.environment))
            .await?
            .unwrap_or_default();

        for (raw, score) in scores {
            let Ok(address) = PeerAddress::parse(&raw) else {
                tracing::warn!(address = %raw, "skipping score entry with invalid address");
                continue;
            };
            let participant = participants
                .entry(address.clone())
                .or_insert_with(|| Participant::new(address));
            participant.score = participant.score.max(score);
        }

        tracing::info!(
            environment = %self.environment,
            participants = participants.len(),
            "ledger loaded"
        );
        Ok(participants.into_values().collect())
    }

    pub async fn load_state(&self) -> Result<Option<StateRecord>, LedgerError> {
        self.read(&RecordKey::state(&self.environment)).await
    }

    /// Overwrite all three records with `snapshot`.
    pub async fn persist(&self, snapshot: &LedgerSnapshot) -> Result<(), LedgerError> {
        self.write(&RecordKey::score(&self.environment), &snapshot.scores())
            .await?;
        self.write(
            &RecordKey::participants(&self.environment),
            &snapshot.participant_records(),
        )
        .await?;
        self.write(&RecordKey::state(&self.environment), &snapshot.state())
            .await?;
        tracing::debug!(
            environment = %self.environment,
            participants = snapshot.participants.len(),
            "ledger snapshot written"
        );
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, key: &RecordKey) -> Result<Option<T>, LedgerError> {
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| LedgerError::Serialization {
                record: key.path(),
                source,
            })
    }

    async fn write<T: Serialize>(&self, key: &RecordKey, value: &T) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(value).map_err(|source| LedgerError::Serialization {
            record: key.path(),
            source,
        })?;
        self.store.put(key, bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::participant::ParticipantState;
    use crate::snapshot::ChainMetadata;
    use relaybot_nullables::{test_peer, NullStore};
    use relaybot_types::Timestamp;

    fn env() -> Environment {
        Environment::parse("basodino").unwrap()
    }

    fn snapshot() -> LedgerSnapshot {
        let mut a = Participant::new(test_peer(1));
        a.score = 21;
        a.state = ParticipantState::Verified;
        a.attestation_url = Some("https://twitter.com/a/status/1".into());
        LedgerSnapshot {
            environment: env(),
            participants: vec![a],
            metadata: ChainMetadata::default(),
            refreshed_at: Timestamp::from_secs(50),
        }
    }

    #[tokio::test]
    async fn persist_then_load_restores_participants() {
        let store = Arc::new(NullStore::new());
        let ledger = LedgerStore::new(store.clone(), env());

        ledger.persist(&snapshot()).await.unwrap();
        let loaded = ledger.load().await.unwrap();

        assert_eq!(loaded, snapshot().participants);
        assert_eq!(store.write_count(), 3);
        let state = ledger.load_state().await.unwrap().unwrap();
        assert_eq!(state.verified_participants, 1);
    }

    #[tokio::test]
    async fn score_only_entries_load_as_unverified() {
        let store = Arc::new(NullStore::new());
        let raw = format!(r#"{{"{}":10,"not-an-address":3}}"#, test_peer(7));
        store.insert_raw(&RecordKey::score(&env()), raw);

        let loaded = LedgerStore::new(store, env()).load().await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].address, test_peer(7));
        assert_eq!(loaded[0].score, 10);
        assert!(!loaded[0].is_verified());
    }

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let ledger = LedgerStore::new(Arc::new(NullStore::new()), env());
        assert!(ledger.load().await.unwrap().is_empty());
        assert!(ledger.load_state().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_failure_is_a_persistence_error() {
        let store = Arc::new(NullStore::new());
        store.fail_writes(true);
        let ledger = LedgerStore::new(store, env());
        assert!(matches!(
            ledger.persist(&snapshot()).await,
            Err(LedgerError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn malformed_record_is_a_serialization_error() {
        let store = Arc::new(NullStore::new());
        store.insert_raw(&RecordKey::score(&env()), "{not json");
        let ledger = LedgerStore::new(store, env());
        assert!(matches!(
            ledger.load().await,
            Err(LedgerError::Serialization { .. })
        ));
    }
}
