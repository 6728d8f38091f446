//! Orchestrator test harness wired entirely to nullables.

#![allow(dead_code)]

use std::sync::Arc;

use relaybot_attestation::{AttestationFlag, AttestationVerifier, AttestationVerifierConfig, FetchOptions};
use relaybot_balance::BalanceGate;
use relaybot_gateway::{InboundMessage, InboundStream, RelayGateway};
use relaybot_ledger::LedgerStore;
use relaybot_nullables::{
    test_peer, NullAttestationFetcher, NullChain, NullClock, NullRandom, NullRelayNode, NullStore,
};
use relaybot_types::{Amount, Clock, Environment, PeerAddress};
use relaybot_verification::{
    BotResponse, Collaborators, MessageOutcome, VerificationOrchestrator, VerificationParams,
};

pub const TAG: &str = "#RelayNetwork";
pub const MENTION: &str = "@relaybot";

pub struct Harness {
    pub bot: PeerAddress,
    pub node: Arc<NullRelayNode>,
    pub clock: Arc<NullClock>,
    pub chain: Arc<NullChain>,
    pub posts: Arc<NullAttestationFetcher>,
    pub store: Arc<NullStore>,
    pub orchestrator: Arc<VerificationOrchestrator>,
    pub inbound: InboundStream,
}

pub fn env() -> Environment {
    Environment::parse("dev").unwrap()
}

pub fn default_params() -> VerificationParams {
    let mut params = VerificationParams::new(env());
    params.balance_threshold = Amount::whole(1);
    params
}

impl Harness {
    pub async fn new() -> Self {
        Self::with(default_params(), Arc::new(NullStore::new())).await
    }

    pub async fn with_params(params: VerificationParams) -> Self {
        Self::with(params, Arc::new(NullStore::new())).await
    }

    pub async fn with(params: VerificationParams, store: Arc<NullStore>) -> Self {
        let bot = test_peer(0);
        let node = Arc::new(NullRelayNode::new(bot.clone()));
        let clock = Arc::new(NullClock::default());
        let chain = Arc::new(NullChain::new());
        let posts = Arc::new(NullAttestationFetcher::new());

        let gateway = Arc::new(RelayGateway::new(node.clone(), clock.clone()));
        let inbound = gateway.start().await.unwrap();

        let attestations = AttestationVerifier::new(
            posts.clone(),
            AttestationVerifierConfig {
                expected_tag: TAG.into(),
                expected_mention: MENTION.into(),
                required: AttestationFlag::ALL.to_vec(),
                fetch: FetchOptions::default(),
            },
        );
        let orchestrator = VerificationOrchestrator::new(
            Collaborators {
                gateway,
                attestations,
                balance: BalanceGate::new(chain.clone()),
                ledger_store: LedgerStore::new(store.clone(), params.environment.clone()),
                clock: clock.clone(),
                random: Arc::new(NullRandom::first()),
            },
            params,
        );

        Self {
            bot,
            node,
            clock,
            chain,
            posts,
            store,
            orchestrator,
            inbound,
        }
    }

    /// Canonical attestation URL of participant `n`.
    pub fn url(n: u32) -> String {
        format!("https://twitter.com/node{n}/status/{}", 1_000 + n)
    }

    /// Publish a valid attestation for `test_peer(n)` and return its URL.
    pub fn attest(&self, n: u32) -> String {
        let url = Self::url(n);
        self.posts.publish(
            &url,
            format!("Running a relay node {TAG} {MENTION} {}", test_peer(n)),
        );
        url
    }

    pub fn set_balance(&self, n: u32, amount: Amount) {
        self.chain
            .set_balance(&self.node.native_of(&test_peer(n)), amount);
    }

    pub fn message(&self, from: &PeerAddress, body: &str) -> InboundMessage {
        InboundMessage {
            from: from.clone(),
            body: body.to_string(),
            origin: self.clock.now(),
            latency_ms: 0,
        }
    }

    /// Verify `test_peer(n)` with a balance of 5.
    pub async fn verify(&self, n: u32) -> PeerAddress {
        let peer = test_peer(n);
        let url = self.attest(n);
        self.set_balance(n, Amount::whole(5));
        let outcome = self
            .orchestrator
            .handle_message(self.message(&peer, &format!("here you go {url}")))
            .await;
        assert!(matches!(outcome, MessageOutcome::Verified { .. }), "{outcome:?}");
        peer
    }

    pub fn bodies_to(&self, peer: &PeerAddress) -> Vec<String> {
        self.node.bodies_to(peer)
    }

    pub fn count_sent(&self, peer: &PeerAddress, response: &BotResponse) -> usize {
        let text = response.to_string();
        self.bodies_to(peer).iter().filter(|b| **b == text).count()
    }
}
