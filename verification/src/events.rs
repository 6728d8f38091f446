//! Events emitted by the orchestrator for the runtime to process.

use relaybot_types::{Amount, PeerAddress};

use crate::probe::ProbeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardReason {
    /// First successful verification.
    Verified,
    /// A relay round trip through the participant.
    Relay,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationEvent {
    /// Attestation and balance checks passed; the participant is in the ledger.
    ParticipantVerified {
        participant: PeerAddress,
        balance: Amount,
    },
    /// Attestation or balance check did not pass.
    VerificationFailed { participant: PeerAddress },
    ProbeStarted { participant: PeerAddress, probe: ProbeId },
    ProbeSucceeded {
        participant: PeerAddress,
        probe: ProbeId,
        latency_ms: u64,
    },
    ProbeTimedOut { participant: PeerAddress, probe: ProbeId },
    /// The probe could not be started; no penalty applies.
    ProbeAborted {
        participant: PeerAddress,
        probe: ProbeId,
        reason: String,
    },
    RewardGranted {
        participant: PeerAddress,
        amount: u64,
        score: u64,
        reason: RewardReason,
    },
    /// Writing the ledger snapshot failed; retried next tick.
    SnapshotFailed { error: String },
}
