//! End-to-end verification and probe scenarios.

mod common;

use std::time::Duration;

use common::Harness;
use relaybot_nullables::test_peer;
use relaybot_types::{Amount, Clock};
use relaybot_verification::{
    relay_test_body, BotResponse, MessageOutcome, TickOutcome, VerificationEvent,
};

const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::test(start_paused = true)]
async fn scenario_a_valid_attestation_and_balance_verifies() {
    let h = Harness::new().await;
    let peer = test_peer(1);
    let url = h.attest(1);
    h.set_balance(1, Amount::whole(5));

    let outcome = h
        .orchestrator
        .handle_message(h.message(&peer, &url))
        .await;

    assert_eq!(
        outcome,
        MessageOutcome::Verified {
            amount: Amount::whole(5),
            score: 10
        }
    );
    let participant = h.orchestrator.participant(&peer).await.unwrap();
    assert!(participant.is_verified());
    assert_eq!(participant.score, 10);
    assert_eq!(participant.attestation_url.as_deref(), Some(url.as_str()));
    assert_eq!(participant.attestation_id.as_deref(), Some("1001"));
    assert_eq!(
        h.count_sent(&peer, &BotResponse::Verified { amount: Amount::whole(5) }),
        1
    );
    let bodies = h.bodies_to(&peer);
    assert_eq!(
        bodies.last().unwrap(),
        &BotResponse::Status {
            verified: true,
            score: 10,
            probe_pending: false
        }
        .to_string()
    );
}

#[tokio::test(start_paused = true)]
async fn scenario_b_zero_balance_is_rejected() {
    let h = Harness::new().await;
    let peer = test_peer(1);
    let url = h.attest(1);

    let outcome = h
        .orchestrator
        .handle_message(h.message(&peer, &url))
        .await;

    assert_eq!(outcome, MessageOutcome::BalanceTooLow { amount: Amount::ZERO });
    assert!(h.orchestrator.participant(&peer).await.is_none());
    assert_eq!(h.orchestrator.score(&peer).await, 0);
    assert_eq!(
        h.count_sent(
            &peer,
            &BotResponse::BalanceTooLow {
                amount: Amount::ZERO,
                threshold: Amount::whole(1)
            }
        ),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn scenario_c_empty_attestation_aborts_probe_silently() {
    let h = Harness::new().await;
    let peer = h.verify(1).await;
    h.posts.publish(&Harness::url(1), "");
    h.node.clear_sent();

    let tick = h.orchestrator.probe_tick().await;

    assert!(matches!(tick, TickOutcome::ProbeAborted { ref participant, .. } if *participant == peer));
    assert!(h.orchestrator.pending_probe(&peer).await.is_none());
    assert!(h.node.channels().is_empty());
    assert!(h.bodies_to(&peer).is_empty());
    assert_eq!(h.orchestrator.score(&peer).await, 10);
    assert!(h.orchestrator.participant(&peer).await.unwrap().is_verified());

    h.attest(1);
    let next = h.orchestrator.probe_tick().await;
    assert_eq!(next, TickOutcome::ProbeStarted { participant: peer });
}

#[tokio::test(start_paused = true)]
async fn scenario_d_round_trip_rewards_and_clears_probe() {
    let h = Harness::new().await;
    let peer = h.verify(1).await;

    let tick = h.orchestrator.probe_tick().await;
    assert_eq!(tick, TickOutcome::ProbeStarted { participant: peer.clone() });
    assert!(h.orchestrator.pending_probe(&peer).await.is_some());

    let relay = h
        .node
        .sent()
        .into_iter()
        .find(|m| m.destination == h.bot)
        .expect("relay test sent to self");
    assert_eq!(relay.path, vec![peer.clone()]);
    assert_eq!(relay.envelope.body, relay_test_body(&peer));
    assert_eq!(h.node.channels(), vec![(peer.clone(), Amount::whole(1))]);
    assert_eq!(h.count_sent(&peer, &BotResponse::Online), 1);

    let mut round_trip = h.message(&h.bot, &relay.envelope.body);
    round_trip.latency_ms = 180;
    let outcome = h.orchestrator.handle_message(round_trip).await;

    assert_eq!(
        outcome,
        MessageOutcome::RoundTrip {
            participant: peer.clone(),
            score: 11
        }
    );
    assert!(h.orchestrator.pending_probe(&peer).await.is_none());
    assert_eq!(
        h.count_sent(&peer, &BotResponse::RelaySucceeded { latency_ms: 180 }),
        1
    );
    assert_eq!(h.count_sent(&peer, &BotResponse::ScoreUpdated { score: 11 }), 1);

    // The cancelled timer never fires.
    tokio::time::sleep(PROBE_TIMEOUT * 2).await;
    assert_eq!(h.count_sent(&peer, &BotResponse::RelayTimedOut), 0);
    assert_eq!(h.orchestrator.score(&peer).await, 11);
}

#[tokio::test(start_paused = true)]
async fn scenario_e_timeout_notifies_and_keeps_participant_eligible() {
    let h = Harness::new().await;
    h.node.set_send_yields(true);
    let peer = h.verify(1).await;

    assert_eq!(
        h.orchestrator.probe_tick().await,
        TickOutcome::ProbeStarted { participant: peer.clone() }
    );
    tokio::time::sleep(PROBE_TIMEOUT + Duration::from_secs(1)).await;
    tokio::task::yield_now().await;

    assert_eq!(h.count_sent(&peer, &BotResponse::RelayTimedOut), 1);
    assert!(h.orchestrator.pending_probe(&peer).await.is_none());
    assert_eq!(h.orchestrator.score(&peer).await, 10);
    assert!(h.orchestrator.participant(&peer).await.unwrap().is_verified());
    let events = h.orchestrator.drain_events().await;
    assert!(events
        .iter()
        .any(|e| matches!(e, VerificationEvent::ProbeTimedOut { participant, .. } if *participant == peer)));

    assert_eq!(
        h.orchestrator.probe_tick().await,
        TickOutcome::ProbeStarted { participant: peer }
    );
}

#[tokio::test(start_paused = true)]
async fn probe_deadline_follows_the_configured_timeout() {
    let h = Harness::new().await;
    let peer = h.verify(1).await;
    let started = h.clock.now();

    h.orchestrator.probe_tick().await;

    let probe = h.orchestrator.pending_probe(&peer).await.unwrap();
    assert_eq!(probe.started_at, started);
    assert_eq!(probe.deadline, started.saturating_add(PROBE_TIMEOUT));
}
