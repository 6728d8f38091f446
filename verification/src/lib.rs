//! Verification orchestrator for the relay bot.
//!
//! Two independent drivers feed the orchestrator:
//! 1. **Inbound messages**: round-trip confirmations reward the probed
//!    participant; everything else runs the attestation and balance checks
//!    that admit a participant to the ledger.
//! 2. **The probe cycle**: on a fixed interval, a random verified participant
//!    is asked to relay a message from the bot back to the bot within a
//!    deadline.
//!
//! Participants are never removed or penalised when a probe fails; they stay
//! eligible for the next tick.

pub mod error;
pub mod events;
pub mod orchestrator;
pub mod params;
pub mod probe;
pub mod random;
pub mod responses;

pub use error::VerificationError;
pub use events::{RewardReason, VerificationEvent};
pub use orchestrator::{Collaborators, MessageOutcome, TickOutcome, VerificationOrchestrator};
pub use params::VerificationParams;
pub use probe::{parse_relay_test, relay_test_body, ProbeId, ProbeOutcome, ProbeRegistry, RelayProbe};
pub use random::ThreadRandom;
pub use responses::BotResponse;
