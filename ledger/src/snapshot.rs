//! Ledger snapshots and the records they are persisted as.

use std::collections::BTreeMap;

use relaybot_types::{Amount, Environment, NativeAddress, PeerAddress, Timestamp};
use serde::{Deserialize, Serialize};

use crate::participant::Participant;

/// Chain and network facts collected alongside a snapshot.
///
/// Each field is collected independently; one that could not be collected
/// stays empty and the snapshot is still written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetadata {
    pub connected_peers: Vec<PeerAddress>,
    pub peer_address: Option<PeerAddress>,
    pub native_address: Option<NativeAddress>,
    /// Chain balance of the bot's own account.
    pub native_balance: Option<Amount>,
    /// Funds the relay node holds for channels.
    pub node_balance: Option<Amount>,
}

/// A point-in-time dump of the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub environment: Environment,
    /// Sorted by address.
    pub participants: Vec<Participant>,
    pub metadata: ChainMetadata,
    pub refreshed_at: Timestamp,
}

/// The `state` record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    pub environment: Environment,
    pub connected_peers: Vec<PeerAddress>,
    pub peer_address: Option<PeerAddress>,
    pub native_address: Option<NativeAddress>,
    pub native_balance: Option<Amount>,
    pub node_balance: Option<Amount>,
    pub verified_participants: usize,
    pub refreshed_at: Timestamp,
}

impl LedgerSnapshot {
    /// The `score` record: address → score.
    pub fn scores(&self) -> BTreeMap<PeerAddress, u64> {
        self.participants
            .iter()
            .map(|p| (p.address.clone(), p.score))
            .collect()
    }

    /// The `participants` record: address → full participant.
    pub fn participant_records(&self) -> BTreeMap<PeerAddress, Participant> {
        self.participants
            .iter()
            .map(|p| (p.address.clone(), p.clone()))
            .collect()
    }

    pub fn state(&self) -> StateRecord {
        StateRecord {
            environment: self.environment.clone(),
            connected_peers: self.metadata.connected_peers.clone(),
            peer_address: self.metadata.peer_address.clone(),
            native_address: self.metadata.native_address.clone(),
            native_balance: self.metadata.native_balance,
            node_balance: self.metadata.node_balance,
            verified_participants: self.participants.iter().filter(|p| p.is_verified()).count(),
            refreshed_at: self.refreshed_at,
        }
    }
}
