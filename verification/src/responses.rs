//! Texts the bot sends to participants.

use std::fmt;

use relaybot_attestation::AttestationFlag;
use relaybot_types::Amount;

/// Every outbound notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotResponse {
    /// First contact without an attestation link.
    Welcome,
    VerificationInProgress,
    VerifyingAttestation,
    AttestationUnreachable,
    AttestationInvalid { missing: Vec<AttestationFlag> },
    AttestationValid,
    BalanceUnavailable,
    BalanceTooLow { amount: Amount, threshold: Amount },
    Verified { amount: Amount },
    /// A probe is about to relay through the participant.
    Online,
    ProbeAborted { reason: String },
    RelaySucceeded { latency_ms: u64 },
    RelayTimedOut,
    ScoreUpdated { score: u64 },
    Status { verified: bool, score: u64, probe_pending: bool },
}

impl fmt::Display for BotResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Welcome => write!(
                f,
                "Hi! To join, publish an attestation post containing your node address and send me its link."
            ),
            Self::VerificationInProgress => {
                write!(f, "A relay test of your node is running, please wait.")
            }
            Self::VerifyingAttestation => write!(f, "Checking your attestation..."),
            Self::AttestationUnreachable => {
                write!(f, "Could not load your attestation. Please try again later.")
            }
            Self::AttestationInvalid { missing } => {
                let missing: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(f, "Your attestation is missing: {}.", missing.join(", "))
            }
            Self::AttestationValid => write!(f, "Attestation looks good. Checking your node balance..."),
            Self::BalanceUnavailable => {
                write!(f, "Could not read your node balance. Please try again later.")
            }
            Self::BalanceTooLow { amount, threshold } => write!(
                f,
                "Your node balance is {amount}, at least {threshold} is required."
            ),
            Self::Verified { amount } => {
                write!(f, "Verified! Your node balance is {amount}. Keep your node online to earn points.")
            }
            Self::Online => write!(f, "Your node is online. Running a relay test through it now."),
            Self::ProbeAborted { reason } => write!(f, "Relay test skipped: {reason}"),
            Self::RelaySucceeded { latency_ms } => write!(
                f,
                "Relay test succeeded in {}.",
                relaybot_utils::format_latency(*latency_ms)
            ),
            Self::RelayTimedOut => write!(f, "Relay test got no response from your node."),
            Self::ScoreUpdated { score } => write!(f, "Your score is now {score}."),
            Self::Status {
                verified,
                score,
                probe_pending,
            } => {
                let state = if *verified { "verified" } else { "not verified" };
                write!(f, "Status: {state}, score {score}")?;
                if *probe_pending {
                    write!(f, ", relay test pending")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_texts_render_token_amounts() {
        let text = BotResponse::BalanceTooLow {
            amount: Amount::ZERO,
            threshold: Amount::new(1_000_000_000_000_000),
        }
        .to_string();
        assert_eq!(text, "Your node balance is 0, at least 0.001 is required.");
    }

    #[test]
    fn invalid_attestation_lists_missing_flags() {
        let text = BotResponse::AttestationInvalid {
            missing: vec![AttestationFlag::Tag, AttestationFlag::SameNode],
        }
        .to_string();
        assert!(text.contains("campaign tag, your node address"));
    }

    #[test]
    fn status_mentions_pending_probe_only_when_pending() {
        let idle = BotResponse::Status {
            verified: true,
            score: 11,
            probe_pending: false,
        };
        assert_eq!(idle.to_string(), "Status: verified, score 11");
        let busy = BotResponse::Status {
            verified: false,
            score: 0,
            probe_pending: true,
        };
        assert!(busy.to_string().ends_with("relay test pending"));
    }
}
