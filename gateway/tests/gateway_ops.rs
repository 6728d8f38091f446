//! Gateway behaviour against the in-memory relay node.

use std::sync::Arc;
use std::time::Duration;

use relaybot_gateway::{GatewayError, IdentityKind, RelayGateway};
use relaybot_nullables::{test_peer, NullClock, NullRelayNode};
use relaybot_types::{Amount, Clock, Timestamp};

fn setup() -> (Arc<NullRelayNode>, Arc<NullClock>, RelayGateway) {
    let node = Arc::new(NullRelayNode::new(test_peer(0)));
    let clock = Arc::new(NullClock::default());
    let gateway = RelayGateway::new(node.clone(), clock.clone());
    (node, clock, gateway)
}

#[tokio::test]
async fn every_operation_requires_start() {
    let (_node, _clock, gateway) = setup();
    let other = test_peer(1);

    assert!(!gateway.is_started());
    assert!(matches!(
        gateway.identity(IdentityKind::Network),
        Err(GatewayError::NotStarted)
    ));
    assert!(matches!(
        gateway.send(&other, "hi", &[]).await,
        Err(GatewayError::NotStarted)
    ));
    assert!(matches!(
        gateway.list_connected_peers().await,
        Err(GatewayError::NotStarted)
    ));
    assert!(matches!(
        gateway.open_channel(&other, Amount::whole(1)).await,
        Err(GatewayError::NotStarted)
    ));
    assert!(matches!(gateway.balance().await, Err(GatewayError::NotStarted)));
    assert!(matches!(
        gateway.native_address_of(&other).await,
        Err(GatewayError::NotStarted)
    ));
}

#[tokio::test]
async fn start_resolves_identities_once() {
    let (node, _clock, gateway) = setup();
    let _inbound = gateway.start().await.unwrap();

    assert!(gateway.is_started());
    assert_eq!(
        gateway.identity(IdentityKind::Network).unwrap(),
        node.peer().to_string()
    );
    assert_eq!(
        gateway.identity(IdentityKind::Native).unwrap(),
        node.native_of(node.peer()).to_string()
    );
    assert!(matches!(
        gateway.start().await,
        Err(GatewayError::AlreadyStarted)
    ));
}

#[tokio::test]
async fn send_wraps_body_in_envelope() {
    let (node, clock, gateway) = setup();
    let _inbound = gateway.start().await.unwrap();
    let dest = test_peer(7);
    let hop = test_peer(8);

    let ack = gateway.send(&dest, "hello", &[hop.clone()]).await.unwrap();

    assert_eq!(ack.destination, dest);
    assert_eq!(ack.origin, clock.now());
    let sent = node.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].path, vec![hop]);
    assert_eq!(sent[0].envelope.body, "hello");
    assert_eq!(&sent[0].envelope.from, node.peer());
}

#[tokio::test]
async fn inbound_latency_is_measured_from_origin() {
    let (node, clock, gateway) = setup();
    let mut inbound = gateway.start().await.unwrap();
    let sender = test_peer(3);

    let origin = clock.now();
    clock.advance(Duration::from_millis(420));
    node.deliver(&sender, "ping", origin);

    let msg = inbound.recv().await.unwrap();
    assert_eq!(msg.from, sender);
    assert_eq!(msg.body, "ping");
    assert_eq!(msg.latency_ms, 420);
}

#[tokio::test]
async fn malformed_payloads_are_dropped() {
    let (node, _clock, gateway) = setup();
    let mut inbound = gateway.start().await.unwrap();
    let sender = test_peer(3);

    node.deliver_raw("not an envelope");
    node.deliver_raw(r#"{"from":"nope","body":"x","ts":1}"#);
    node.deliver(&sender, "after garbage", Timestamp::from_millis(0));

    let msg = inbound.recv().await.unwrap();
    assert_eq!(msg.body, "after garbage");
}

#[tokio::test]
async fn loopback_send_comes_back_from_self() {
    let (node, _clock, gateway) = setup();
    let mut inbound = gateway.start().await.unwrap();
    node.set_loopback(true);
    let me = gateway.peer_address().unwrap();

    gateway.send(&me, "relay-test", &[test_peer(5)]).await.unwrap();

    let msg = inbound.recv().await.unwrap();
    assert_eq!(msg.from, me);
    assert_eq!(msg.body, "relay-test");
}

#[tokio::test]
async fn node_failures_surface_as_errors() {
    let (node, _clock, gateway) = setup();
    let _inbound = gateway.start().await.unwrap();
    node.fail_sends(true);
    node.fail_channels(true);

    assert!(matches!(
        gateway.send(&test_peer(2), "x", &[]).await,
        Err(GatewayError::Transport(_))
    ));
    assert!(matches!(
        gateway.open_channel(&test_peer(2), Amount::whole(1)).await,
        Err(GatewayError::Node(_))
    ));
}
