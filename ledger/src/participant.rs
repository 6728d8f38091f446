//! Participant records.

use relaybot_types::{NativeAddress, PeerAddress, Timestamp};
use serde::{Deserialize, Serialize};

/// Verification state persisted with a participant.
///
/// Transient states (attestation pending, probe pending) live in the
/// orchestrator; only the durable outcome is recorded here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantState {
    #[default]
    Unverified,
    Verified,
}

/// A remote relay node being verified and rewarded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub address: PeerAddress,
    /// Chain account of the participant's node, cached once derived.
    #[serde(default)]
    pub native_address: Option<NativeAddress>,
    /// Status id of the attestation post.
    #[serde(default)]
    pub attestation_id: Option<String>,
    #[serde(default)]
    pub attestation_url: Option<String>,
    #[serde(default)]
    pub score: u64,
    #[serde(default)]
    pub state: ParticipantState,
    #[serde(default)]
    pub verified_at: Option<Timestamp>,
}

impl Participant {
    pub fn new(address: PeerAddress) -> Self {
        Self {
            address,
            native_address: None,
            attestation_id: None,
            attestation_url: None,
            score: 0,
            state: ParticipantState::Unverified,
            verified_at: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.state == ParticipantState::Verified
    }

    /// Merge the fields present in `update`. The score is never touched.
    pub fn apply(&mut self, update: ParticipantUpdate) {
        if let Some(native) = update.native_address {
            self.native_address = Some(native);
        }
        if let Some(id) = update.attestation_id {
            self.attestation_id = Some(id);
        }
        if let Some(url) = update.attestation_url {
            self.attestation_url = Some(url);
        }
        if let Some(state) = update.state {
            self.state = state;
        }
        if let Some(at) = update.verified_at {
            self.verified_at = Some(at);
        }
    }

    /// Fill fields this record lacks from `other` and keep the higher score.
    pub(crate) fn absorb(&mut self, other: Participant) {
        let other_verified = other.is_verified();
        self.native_address = self.native_address.take().or(other.native_address);
        self.attestation_id = self.attestation_id.take().or(other.attestation_id);
        self.attestation_url = self.attestation_url.take().or(other.attestation_url);
        self.verified_at = self.verified_at.or(other.verified_at);
        if other_verified {
            self.state = ParticipantState::Verified;
        }
        self.score = self.score.max(other.score);
    }
}

/// Field changes for [`crate::ParticipantLedger::upsert`]. `None` leaves a
/// field as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParticipantUpdate {
    pub native_address: Option<NativeAddress>,
    pub attestation_id: Option<String>,
    pub attestation_url: Option<String>,
    pub state: Option<ParticipantState>,
    pub verified_at: Option<Timestamp>,
}

impl ParticipantUpdate {
    /// The update recorded when a participant passes attestation and balance
    /// checks.
    pub fn verified(
        attestation_url: &str,
        attestation_id: Option<String>,
        native_address: NativeAddress,
        at: Timestamp,
    ) -> Self {
        Self {
            native_address: Some(native_address),
            attestation_id,
            attestation_url: Some(attestation_url.to_string()),
            state: Some(ParticipantState::Verified),
            verified_at: Some(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_nullables::test_peer;

    #[test]
    fn apply_merges_only_present_fields() {
        let mut p = Participant::new(test_peer(1));
        p.attestation_url = Some("https://x.com/a/status/1".into());
        p.score = 12;

        p.apply(ParticipantUpdate {
            state: Some(ParticipantState::Verified),
            ..Default::default()
        });

        assert!(p.is_verified());
        assert_eq!(p.attestation_url.as_deref(), Some("https://x.com/a/status/1"));
        assert_eq!(p.score, 12);
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let raw = format!(r#"{{"address":"{}"}}"#, test_peer(2));
        let p: Participant = serde_json::from_str(&raw).unwrap();
        assert_eq!(p, Participant::new(test_peer(2)));
    }

    #[test]
    fn absorb_fills_gaps_and_keeps_verification() {
        let mut live = Participant::new(test_peer(3));
        live.score = 4;
        live.attestation_id = Some("live".into());

        let mut stored = Participant::new(test_peer(3));
        stored.score = 9;
        stored.state = ParticipantState::Verified;
        stored.attestation_id = Some("stored".into());
        stored.attestation_url = Some("https://x.com/c/status/3".into());

        live.absorb(stored);

        assert!(live.is_verified());
        assert_eq!(live.score, 9);
        assert_eq!(live.attestation_id.as_deref(), Some("live"));
        assert_eq!(live.attestation_url.as_deref(), Some("https://x.com/c/status/3"));
    }
}
