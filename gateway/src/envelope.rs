//! Relay message envelope.
//!
//! Every payload the bot sends over the relay network is wrapped in an
//! [`Envelope`]. The relay network is anonymous, so the envelope is also where
//! the sender identity travels. The wire form is a compact JSON object:
//!
//! ```text
//! {"from":"16Uiu2…","body":"hello","ts":1700000000000}
//! ```

use relaybot_types::{PeerAddress, Timestamp};
use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// Upper bound on an encoded envelope accepted from the wire.
pub const MAX_ENVELOPE_LEN: usize = 64 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: PeerAddress,
    pub body: String,
    #[serde(rename = "ts")]
    pub origin: Timestamp,
}

impl Envelope {
    pub fn new(from: PeerAddress, body: impl Into<String>, origin: Timestamp) -> Self {
        Self {
            from,
            body: body.into(),
            origin,
        }
    }

    pub fn encode(&self) -> String {
        // Only strings and integers: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Result<Self, GatewayError> {
        if raw.len() > MAX_ENVELOPE_LEN {
            return Err(GatewayError::Decode(format!(
                "envelope of {} bytes exceeds {MAX_ENVELOPE_LEN}",
                raw.len()
            )));
        }
        serde_json::from_str(raw.trim()).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    /// Round-trip latency as seen at `now`. A sender clock ahead of ours
    /// yields zero rather than a negative value.
    pub fn latency_ms(&self, now: Timestamp) -> u64 {
        self.origin.millis_until(now)
    }
}
