//! Nullable relay node: records sends and delivers scripted inbound traffic.

use async_trait::async_trait;
use relaybot_gateway::{ChannelId, Envelope, GatewayError, RelayNode};
use relaybot_types::{Amount, NativeAddress, PeerAddress, Timestamp};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

const BASE58: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// A valid, distinct peer address for test number `n`.
pub fn test_peer(n: u32) -> PeerAddress {
    let mut digits = Vec::new();
    let mut rest = n as usize;
    loop {
        digits.push(BASE58[rest % BASE58.len()]);
        rest /= BASE58.len();
        if rest == 0 {
            break;
        }
    }
    digits.reverse();
    let tail = String::from_utf8_lossy(&digits).into_owned();
    PeerAddress::parse(&format!("16Uiu2HAmTestPeer{tail:1>36}")).unwrap()
}

/// Deterministic chain address for a peer: the last 20 bytes of its id.
fn derived_native(peer: &PeerAddress) -> NativeAddress {
    let bytes = peer.as_str().as_bytes();
    let tail = &bytes[bytes.len().saturating_sub(20)..];
    let hex: String = tail.iter().map(|b| format!("{b:02x}")).collect();
    NativeAddress::parse(&format!("0x{hex:0>40}")).unwrap()
}

/// A payload handed to the node for sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: PeerAddress,
    pub path: Vec<PeerAddress>,
    pub envelope: Envelope,
}

/// An in-memory [`RelayNode`].
///
/// Sends are recorded, never transmitted. With loopback enabled, a message
/// addressed to the node itself is delivered back to its inbound stream, which
/// is what a successful relay through the intermediate hop looks like.
pub struct NullRelayNode {
    peer: PeerAddress,
    native: NativeAddress,
    inbound_tx: mpsc::Sender<String>,
    inbound_rx: Mutex<Option<mpsc::Receiver<String>>>,
    sent: Mutex<Vec<SentMessage>>,
    channels: Mutex<Vec<(PeerAddress, Amount)>>,
    connected: Mutex<Vec<PeerAddress>>,
    natives: Mutex<HashMap<PeerAddress, NativeAddress>>,
    balance: Mutex<Amount>,
    fail_sends: AtomicBool,
    fail_channels: AtomicBool,
    loopback: AtomicBool,
    send_yields: AtomicBool,
    channel_counter: AtomicUsize,
}

impl NullRelayNode {
    pub fn new(peer: PeerAddress) -> Self {
        let native = derived_native(&peer);
        let (inbound_tx, inbound_rx) = mpsc::channel(1024);
        Self {
            peer,
            native,
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
            sent: Mutex::new(Vec::new()),
            channels: Mutex::new(Vec::new()),
            connected: Mutex::new(Vec::new()),
            natives: Mutex::new(HashMap::new()),
            balance: Mutex::new(Amount::ZERO),
            fail_sends: AtomicBool::new(false),
            fail_channels: AtomicBool::new(false),
            loopback: AtomicBool::new(false),
            send_yields: AtomicBool::new(false),
            channel_counter: AtomicUsize::new(0),
        }
    }

    pub fn peer(&self) -> &PeerAddress {
        &self.peer
    }

    /// The chain address the node reports for `peer`.
    pub fn native_of(&self, peer: &PeerAddress) -> NativeAddress {
        self.natives
            .lock()
            .unwrap()
            .get(peer)
            .cloned()
            .unwrap_or_else(|| derived_native(peer))
    }

    pub fn set_native_of(&self, peer: &PeerAddress, native: NativeAddress) {
        self.natives.lock().unwrap().insert(peer.clone(), native);
    }

    pub fn set_connected(&self, peers: Vec<PeerAddress>) {
        *self.connected.lock().unwrap() = peers;
    }

    pub fn set_balance(&self, amount: Amount) {
        *self.balance.lock().unwrap() = amount;
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_channels(&self, fail: bool) {
        self.fail_channels.store(fail, Ordering::SeqCst);
    }

    pub fn set_loopback(&self, enabled: bool) {
        self.loopback.store(enabled, Ordering::SeqCst);
    }

    /// Make every send suspend once before completing, the way a send over
    /// a real transport does.
    pub fn set_send_yields(&self, enabled: bool) {
        self.send_yields.store(enabled, Ordering::SeqCst);
    }

    /// Deliver a message from `from` to the node's inbound stream.
    pub fn deliver(&self, from: &PeerAddress, body: &str, origin: Timestamp) {
        let envelope = Envelope::new(from.clone(), body, origin);
        self.deliver_raw(envelope.encode());
    }

    /// Deliver an arbitrary raw payload, well-formed or not.
    pub fn deliver_raw(&self, payload: impl Into<String>) {
        let _ = self.inbound_tx.try_send(payload.into());
    }

    /// Every message sent so far.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Bodies of the messages sent to `destination`, in order.
    pub fn bodies_to(&self, destination: &PeerAddress) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.destination == destination)
            .map(|m| m.envelope.body.clone())
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// Channels opened so far.
    pub fn channels(&self) -> Vec<(PeerAddress, Amount)> {
        self.channels.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayNode for NullRelayNode {
    async fn start(&self) -> Result<mpsc::Receiver<String>, GatewayError> {
        self.inbound_rx
            .lock()
            .unwrap()
            .take()
            .ok_or(GatewayError::AlreadyStarted)
    }

    async fn peer_address(&self) -> Result<PeerAddress, GatewayError> {
        Ok(self.peer.clone())
    }

    async fn native_address(&self) -> Result<NativeAddress, GatewayError> {
        Ok(self.native.clone())
    }

    async fn native_address_of(&self, peer: &PeerAddress) -> Result<NativeAddress, GatewayError> {
        Ok(self.native_of(peer))
    }

    async fn send_message(
        &self,
        destination: &PeerAddress,
        payload: String,
        path: &[PeerAddress],
    ) -> Result<(), GatewayError> {
        if self.send_yields.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("injected send failure".into()));
        }
        let envelope = Envelope::decode(&payload)?;
        self.sent.lock().unwrap().push(SentMessage {
            destination: destination.clone(),
            path: path.to_vec(),
            envelope,
        });
        if destination == &self.peer && self.loopback.load(Ordering::SeqCst) {
            self.deliver_raw(payload);
        }
        Ok(())
    }

    async fn connected_peers(&self) -> Result<Vec<PeerAddress>, GatewayError> {
        Ok(self.connected.lock().unwrap().clone())
    }

    async fn open_channel(
        &self,
        counterparty: &PeerAddress,
        amount: Amount,
    ) -> Result<ChannelId, GatewayError> {
        if self.fail_channels.load(Ordering::SeqCst) {
            return Err(GatewayError::Node("injected channel failure".into()));
        }
        self.channels
            .lock()
            .unwrap()
            .push((counterparty.clone(), amount));
        let n = self.channel_counter.fetch_add(1, Ordering::SeqCst);
        Ok(ChannelId(format!("0x{n:064x}")))
    }

    async fn balance(&self) -> Result<Amount, GatewayError> {
        Ok(*self.balance.lock().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peers_are_valid_and_distinct() {
        let a = test_peer(0);
        let b = test_peer(1);
        let c = test_peer(4_000);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(a.as_str().len(), 53);
    }

    #[test]
    fn derived_natives_differ_per_peer() {
        let node = NullRelayNode::new(test_peer(0));
        assert_ne!(node.native_of(&test_peer(1)), node.native_of(&test_peer(2)));
    }
}
