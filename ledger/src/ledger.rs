//! In-memory participant ledger.

use std::collections::HashMap;

use relaybot_types::{Environment, PeerAddress, Timestamp};

use crate::participant::{Participant, ParticipantUpdate};
use crate::snapshot::{ChainMetadata, LedgerSnapshot};

/// Participants keyed by peer address.
///
/// Not synchronised; the orchestrator owns it behind its state lock.
#[derive(Debug, Default)]
pub struct ParticipantLedger {
    participants: HashMap<PeerAddress, Participant>,
}

impl ParticipantLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, address: &PeerAddress) -> Option<&Participant> {
        self.participants.get(address)
    }

    /// Create or update a participant, merging `update` into existing fields.
    /// The score is left as is.
    pub fn upsert(&mut self, address: &PeerAddress, update: ParticipantUpdate) -> &Participant {
        let participant = self
            .participants
            .entry(address.clone())
            .or_insert_with(|| Participant::new(address.clone()));
        participant.apply(update);
        participant
    }

    /// Add `amount` to a participant's score and return the new score.
    ///
    /// An address without a record gets an unverified one carrying the reward.
    pub fn add_reward(&mut self, address: &PeerAddress, amount: u64) -> u64 {
        let participant = self
            .participants
            .entry(address.clone())
            .or_insert_with(|| Participant::new(address.clone()));
        participant.score = participant.score.saturating_add(amount);
        tracing::debug!(peer = %address, amount, score = participant.score, "reward added");
        participant.score
    }

    /// Current score, zero for unknown addresses.
    pub fn score(&self, address: &PeerAddress) -> u64 {
        self.participants.get(address).map_or(0, |p| p.score)
    }

    pub fn is_verified(&self, address: &PeerAddress) -> bool {
        self.participants
            .get(address)
            .is_some_and(Participant::is_verified)
    }

    /// Verified participants in address order.
    pub fn verified(&self) -> Vec<PeerAddress> {
        let mut out: Vec<PeerAddress> = self
            .participants
            .values()
            .filter(|p| p.is_verified())
            .map(|p| p.address.clone())
            .collect();
        out.sort();
        out
    }

    pub fn verified_count(&self) -> usize {
        self.participants.values().filter(|p| p.is_verified()).count()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Merge participants loaded from storage.
    ///
    /// Records created since startup keep their fields; gaps are filled from
    /// the persisted record and the higher score wins, so no score decreases.
    pub fn merge_persisted(&mut self, persisted: Vec<Participant>) {
        for loaded in persisted {
            match self.participants.get_mut(&loaded.address) {
                Some(existing) => existing.absorb(loaded),
                None => {
                    self.participants.insert(loaded.address.clone(), loaded);
                }
            }
        }
    }

    /// Point-in-time copy of every participant plus chain metadata.
    pub fn snapshot(
        &self,
        environment: &Environment,
        metadata: ChainMetadata,
        refreshed_at: Timestamp,
    ) -> LedgerSnapshot {
        let mut participants: Vec<Participant> = self.participants.values().cloned().collect();
        participants.sort_by(|a, b| a.address.cmp(&b.address));
        LedgerSnapshot {
            environment: environment.clone(),
            participants,
            metadata,
            refreshed_at,
        }
    }
}
