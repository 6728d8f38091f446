//! Orchestrator parameters.

use std::time::Duration;

use relaybot_types::{Amount, Environment, Timestamp};

/// Tunables of the verification flow and the probe cycle.
#[derive(Clone, Debug)]
pub struct VerificationParams {
    /// Campaign environment the ledger lives in.
    pub environment: Environment,
    /// No probes run before this instant.
    pub campaign_start: Timestamp,
    /// Hard deadline for a relay round trip.
    pub probe_timeout: Duration,
    /// Score added per successful round trip.
    pub relay_reward: u64,
    /// Score granted on first verification.
    pub verified_bonus: u64,
    /// Size of the payment channel opened to a probed participant.
    pub channel_amount: Amount,
    /// Minimum node balance for verification.
    pub balance_threshold: Amount,
    pub debug: bool,
    /// With `debug`, checked in place of the sender for the same-node flag.
    pub debug_attestation_identity: Option<String>,
}

impl VerificationParams {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            campaign_start: Timestamp::from_millis(0),
            probe_timeout: Duration::from_secs(60),
            relay_reward: 1,
            verified_bonus: 10,
            channel_amount: Amount::whole(1),
            balance_threshold: Amount::new(1_000_000_000_000_000),
            debug: false,
            debug_attestation_identity: None,
        }
    }
}
