use relaybot_types::PeerAddress;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("a relay probe for {0} is already pending")]
    ProbeAlreadyPending(PeerAddress),
}
