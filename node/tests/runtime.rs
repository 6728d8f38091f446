//! End-to-end runs of the bot runtime against nullables.

use std::sync::Arc;
use std::time::Duration;

use relaybot_node::{BotConfig, BotError, BotServices, RelayBot};
use relaybot_nullables::{
    test_peer, NullAttestationFetcher, NullChain, NullClock, NullRandom, NullRelayNode, NullStore,
};
use relaybot_store::{KeyValueStore, RecordKey};
use relaybot_store_lmdb::LmdbStore;
use relaybot_types::{Amount, Clock, Environment, PeerAddress};

struct World {
    node: Arc<NullRelayNode>,
    clock: Arc<NullClock>,
    chain: Arc<NullChain>,
    posts: Arc<NullAttestationFetcher>,
}

impl World {
    fn new() -> Self {
        let node = Arc::new(NullRelayNode::new(test_peer(0)));
        node.set_loopback(true);
        Self {
            node,
            clock: Arc::new(NullClock::default()),
            chain: Arc::new(NullChain::new()),
            posts: Arc::new(NullAttestationFetcher::new()),
        }
    }

    fn services(&self, store: Arc<dyn KeyValueStore>) -> BotServices {
        BotServices {
            node: self.node.clone(),
            store,
            chain: self.chain.clone(),
            fetcher: self.posts.clone(),
            clock: self.clock.clone(),
            random: Arc::new(NullRandom::first()),
        }
    }

    /// Publish a valid attestation for `test_peer(n)`, fund its chain address
    /// and send the link to the bot.
    fn submit(&self, n: u32) -> PeerAddress {
        let peer = test_peer(n);
        let url = format!("https://twitter.com/node{n}/status/{}", 2_000 + n);
        self.posts
            .publish(&url, format!("#RelayNetwork @relaybot {peer}"));
        self.chain
            .set_balance(&self.node.native_of(&peer), Amount::whole(3));
        self.node
            .deliver(&peer, &format!("my attestation {url}"), self.clock.now());
        peer
    }
}

fn config() -> BotConfig {
    BotConfig {
        balance_threshold: 1_000,
        ..BotConfig::default()
    }
}

async fn wait_for_score(bot: &RelayBot, peer: &PeerAddress, score: u64) {
    for _ in 0..600 {
        if bot.orchestrator().score(peer).await == score {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!(
        "score of {peer} stuck at {}",
        bot.orchestrator().score(peer).await
    );
}

#[tokio::test(start_paused = true)]
async fn verified_participant_completes_a_relay_round_trip() {
    let world = World::new();
    let mut bot = RelayBot::new(config(), world.services(Arc::new(NullStore::new()))).unwrap();
    bot.start().await.unwrap();

    let peer = world.submit(1);
    wait_for_score(&bot, &peer, 10).await;

    // The next probe-cycle tick sends the relay test through the participant.
    wait_for_score(&bot, &peer, 11).await;
    // Let the handler finish publishing its events.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(world.node.channels(), vec![(peer.clone(), Amount::whole(1))]);

    let metrics = bot.metrics();
    assert_eq!(metrics.verifications_passed.get(), 1);
    assert!(metrics.probes_succeeded.get() >= 1);
    assert!(metrics.messages_handled.get() >= 2);

    bot.stop().await.unwrap();
    assert!(!bot.is_started());
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected() {
    let world = World::new();
    let mut bot = RelayBot::new(config(), world.services(Arc::new(NullStore::new()))).unwrap();
    bot.start().await.unwrap();
    assert!(matches!(bot.start().await, Err(BotError::AlreadyStarted)));
    bot.stop().await.unwrap();
}

#[tokio::test]
async fn invalid_config_is_rejected_before_serving() {
    let world = World::new();
    let config = BotConfig {
        restore_from_environment: Some("dev".into()),
        ..config()
    };
    let result = RelayBot::new(config, world.services(Arc::new(NullStore::new())));
    assert!(matches!(result, Err(BotError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn stop_writes_a_final_snapshot() {
    let world = World::new();
    let store = Arc::new(NullStore::new());
    let mut bot = RelayBot::new(config(), world.services(store.clone())).unwrap();
    bot.start().await.unwrap();

    let peer = world.submit(4);
    wait_for_score(&bot, &peer, 10).await;
    bot.stop().await.unwrap();

    let env = Environment::parse("dev").unwrap();
    let raw = store.raw(&RecordKey::score(&env)).expect("score record");
    let scores: std::collections::BTreeMap<String, u64> = serde_json_scores(&raw);
    assert!(scores.get(peer.as_str()).is_some_and(|s| *s >= 10));
    assert_eq!(bot.orchestrator().pending_probe_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn restored_scores_carry_over_without_a_second_bonus() {
    let world = World::new();
    let store = Arc::new(NullStore::new());
    let season_1 = Environment::parse("season-1").unwrap();
    let peer = test_peer(7);
    store.insert_raw(
        &RecordKey::score(&season_1),
        format!(r#"{{"{}": 42}}"#, peer.as_str()),
    );

    let config = BotConfig {
        environment: "season-2".into(),
        restore_from_environment: Some("season-1".into()),
        // Keep the probe cycle out of the way.
        verification_cycle_secs: 3_600,
        ..config()
    };
    let mut bot = RelayBot::new(config, world.services(store.clone())).unwrap();
    bot.start().await.unwrap();
    wait_for_score(&bot, &peer, 10).await;

    world.submit(7);
    for _ in 0..50 {
        if bot.orchestrator().verified_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(bot.orchestrator().verified_count().await, 1);
    assert_eq!(bot.orchestrator().score(&peer).await, 10);
    bot.stop().await.unwrap();
}

#[tokio::test]
async fn ledger_survives_a_restart_on_lmdb() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(LmdbStore::open(dir.path(), 16 * 1024 * 1024).unwrap());
    let peer = test_peer(9);

    {
        let world = World::new();
        let mut bot = RelayBot::new(config(), world.services(store.clone())).unwrap();
        bot.start().await.unwrap();
        world.submit(9);
        wait_for_score(&bot, &peer, 10).await;
        bot.stop().await.unwrap();
    }

    let world = World::new();
    let mut bot = RelayBot::new(config(), world.services(store.clone())).unwrap();
    bot.start().await.unwrap();
    for _ in 0..100 {
        if bot.orchestrator().verified_count().await == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let participant = bot
        .orchestrator()
        .participant(&peer)
        .await
        .expect("participant reloaded");
    assert!(participant.is_verified());
    assert!(participant.score >= 10);
    bot.stop().await.unwrap();
}

fn serde_json_scores(raw: &[u8]) -> std::collections::BTreeMap<String, u64> {
    serde_json::from_slice(raw).expect("score record is a JSON object")
}
