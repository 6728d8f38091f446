//! The started-guarded relay gateway.

use std::sync::{Arc, OnceLock};

use relaybot_types::{Amount, Clock, NativeAddress, PeerAddress, Timestamp};
use tokio::sync::mpsc;

use crate::envelope::Envelope;
use crate::node::{ChannelId, IdentityKind, RelayNode};
use crate::GatewayError;

/// Identities resolved once during start.
#[derive(Clone, Debug)]
struct GatewayIdentity {
    peer: PeerAddress,
    native: NativeAddress,
}

/// Acknowledgement of an accepted send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendAck {
    pub destination: PeerAddress,
    pub origin: Timestamp,
}

/// A decoded inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub from: PeerAddress,
    pub body: String,
    pub origin: Timestamp,
    pub latency_ms: u64,
}

/// Wraps a [`RelayNode`] with the start guard and the envelope codec.
pub struct RelayGateway {
    node: Arc<dyn RelayNode>,
    clock: Arc<dyn Clock>,
    identity: OnceLock<GatewayIdentity>,
}

impl RelayGateway {
    pub fn new(node: Arc<dyn RelayNode>, clock: Arc<dyn Clock>) -> Self {
        Self {
            node,
            clock,
            identity: OnceLock::new(),
        }
    }

    /// Start the node, resolve our identities and return the inbound stream.
    pub async fn start(&self) -> Result<InboundStream, GatewayError> {
        if self.identity.get().is_some() {
            return Err(GatewayError::AlreadyStarted);
        }
        let raw = self.node.start().await?;
        let peer = self.node.peer_address().await?;
        let native = self.node.native_address().await?;
        tracing::info!(peer = %peer, native = %native, "relay gateway started");
        self.identity
            .set(GatewayIdentity { peer, native })
            .map_err(|_| GatewayError::AlreadyStarted)?;
        Ok(InboundStream {
            raw,
            clock: Arc::clone(&self.clock),
        })
    }

    pub fn is_started(&self) -> bool {
        self.identity.get().is_some()
    }

    fn ensure_started(&self) -> Result<&GatewayIdentity, GatewayError> {
        self.identity.get().ok_or_else(|| {
            tracing::error!("relay gateway operation invoked before start");
            GatewayError::NotStarted
        })
    }

    /// Our identity of the requested kind, rendered as a string.
    pub fn identity(&self, kind: IdentityKind) -> Result<String, GatewayError> {
        let id = self.ensure_started()?;
        Ok(match kind {
            IdentityKind::Native => id.native.to_string(),
            IdentityKind::Network => id.peer.to_string(),
        })
    }

    pub fn peer_address(&self) -> Result<PeerAddress, GatewayError> {
        Ok(self.ensure_started()?.peer.clone())
    }

    pub fn native_address(&self) -> Result<NativeAddress, GatewayError> {
        Ok(self.ensure_started()?.native.clone())
    }

    /// Wrap `body` in an envelope and send it to `destination` via
    /// `intermediate_hops`.
    pub async fn send(
        &self,
        destination: &PeerAddress,
        body: &str,
        intermediate_hops: &[PeerAddress],
    ) -> Result<SendAck, GatewayError> {
        let id = self.ensure_started()?;
        let origin = self.clock.now();
        let envelope = Envelope::new(id.peer.clone(), body, origin);
        self.node
            .send_message(destination, envelope.encode(), intermediate_hops)
            .await?;
        tracing::debug!(
            to = %destination,
            hops = intermediate_hops.len(),
            "relay message sent"
        );
        Ok(SendAck {
            destination: destination.clone(),
            origin,
        })
    }

    pub async fn list_connected_peers(&self) -> Result<Vec<PeerAddress>, GatewayError> {
        self.ensure_started()?;
        self.node.connected_peers().await
    }

    pub async fn open_channel(
        &self,
        counterparty: &PeerAddress,
        amount: Amount,
    ) -> Result<ChannelId, GatewayError> {
        self.ensure_started()?;
        let channel = self.node.open_channel(counterparty, amount).await?;
        tracing::debug!(counterparty = %counterparty, %channel, %amount, "channel opened");
        Ok(channel)
    }

    pub async fn balance(&self) -> Result<Amount, GatewayError> {
        self.ensure_started()?;
        self.node.balance().await
    }

    pub async fn native_address_of(
        &self,
        peer: &PeerAddress,
    ) -> Result<NativeAddress, GatewayError> {
        self.ensure_started()?;
        self.node.native_address_of(peer).await
    }
}

/// Decoding view over the node's raw inbound payloads.
pub struct InboundStream {
    raw: mpsc::Receiver<String>,
    clock: Arc<dyn Clock>,
}

impl InboundStream {
    /// Next well-formed message. Malformed payloads are logged and skipped;
    /// `None` once the node closes the stream.
    pub async fn recv(&mut self) -> Option<InboundMessage> {
        loop {
            let raw = self.raw.recv().await?;
            match Envelope::decode(&raw) {
                Ok(envelope) => {
                    let latency_ms = envelope.latency_ms(self.clock.now());
                    return Some(InboundMessage {
                        from: envelope.from,
                        body: envelope.body,
                        origin: envelope.origin,
                        latency_ms,
                    });
                }
                Err(e) => {
                    tracing::warn!(len = raw.len(), "dropping inbound payload: {e}");
                }
            }
        }
    }
}
