//! Port to the external relay node.

use async_trait::async_trait;
use relaybot_types::{Amount, NativeAddress, PeerAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

use crate::GatewayError;

/// Which of the node's identities to resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityKind {
    /// The chain account of the node.
    Native,
    /// The relay network peer id.
    Network,
}

/// Identifier of a payment channel opened by the node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The relay network node, consumed as opaque operations.
///
/// Implementations: [`crate::RestRelayNode`] for a node exposing a REST +
/// WebSocket API, and the in-memory node from `relaybot-nullables` for tests.
#[async_trait]
pub trait RelayNode: Send + Sync {
    /// Bring the node connection up and return the stream of raw inbound
    /// payloads.
    async fn start(&self) -> Result<mpsc::Receiver<String>, GatewayError>;

    /// The node's relay network identity.
    async fn peer_address(&self) -> Result<PeerAddress, GatewayError>;

    /// The node's chain account.
    async fn native_address(&self) -> Result<NativeAddress, GatewayError>;

    /// Chain account belonging to another peer.
    async fn native_address_of(&self, peer: &PeerAddress) -> Result<NativeAddress, GatewayError>;

    /// Send `payload` to `destination`, relayed through `path` in order.
    async fn send_message(
        &self,
        destination: &PeerAddress,
        payload: String,
        path: &[PeerAddress],
    ) -> Result<(), GatewayError>;

    async fn connected_peers(&self) -> Result<Vec<PeerAddress>, GatewayError>;

    async fn open_channel(
        &self,
        counterparty: &PeerAddress,
        amount: Amount,
    ) -> Result<ChannelId, GatewayError>;

    /// Funds available to the node for channels.
    async fn balance(&self) -> Result<Amount, GatewayError>;
}
