//! Verification orchestrator: connects the relay gateway, attestation
//! verifier, balance gate and ledger into the inbound message state machine
//! and the periodic relay probe cycle.
//!
//! The orchestrator is shared as `Arc<Self>` by the inbound message loop, the
//! probe timer and one timeout task per pending probe. Its mutable state sits
//! behind one lock that is never held across a call to a collaborator. Two
//! guards keep probes race-free:
//! - the pending-probe check runs before any other branch for a message that
//!   is not a round trip
//! - a probe is registered in the same critical section that selects its
//!   participant, before the first asynchronous step of starting it

use std::sync::Arc;

use relaybot_attestation::{AttestationUrl, AttestationVerifier, Decision};
use relaybot_balance::BalanceGate;
use relaybot_gateway::{InboundMessage, RelayGateway};
use relaybot_ledger::{
    ChainMetadata, LedgerError, LedgerStore, Participant, ParticipantLedger, ParticipantUpdate,
};
use relaybot_types::{Amount, Clock, NativeAddress, PeerAddress, RandomSource};
use tokio::sync::{Mutex, OnceCell};

use crate::events::{RewardReason, VerificationEvent};
use crate::params::VerificationParams;
use crate::probe::{parse_relay_test, relay_test_body, ProbeRegistry, RelayProbe};
use crate::responses::BotResponse;

/// What handling one inbound message led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    /// A relay test came back; `participant` was rewarded.
    RoundTrip { participant: PeerAddress, score: u64 },
    /// A self-addressed message without a recognisable relay-test body.
    Dropped,
    /// The sender has a probe pending.
    InProgress,
    /// No attestation link in the message.
    Unrecognised,
    AttestationUnreachable,
    AttestationInvalid,
    BalanceUnavailable,
    BalanceTooLow { amount: Amount },
    Verified { amount: Amount, score: u64 },
}

/// What one probe-cycle tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Persisted participants could not be loaded; nothing else ran.
    LedgerUnavailable,
    BeforeCampaign,
    NoCandidate,
    ProbeStarted { participant: PeerAddress },
    ProbeAborted { participant: PeerAddress, reason: String },
}

/// Why a probe could not be started.
enum ProbeAbort {
    NoAttestation,
    AttestationUnreachable(String),
    AttestationEmpty,
    AttestationInvalid,
    Channel(String),
    Send(String),
}

impl ProbeAbort {
    fn reason(&self) -> String {
        match self {
            Self::NoAttestation => "no attestation on record".into(),
            Self::AttestationUnreachable(e) => format!("attestation unreachable: {e}"),
            Self::AttestationEmpty => "attestation is empty".into(),
            Self::AttestationInvalid => "attestation no longer valid".into(),
            Self::Channel(e) => format!("could not open a channel: {e}"),
            Self::Send(e) => format!("could not send the relay test: {e}"),
        }
    }
}

#[derive(Default)]
struct OrchestratorState {
    ledger: ParticipantLedger,
    probes: ProbeRegistry,
    pending_events: Vec<VerificationEvent>,
}

/// The external collaborators of the orchestrator.
pub struct Collaborators {
    pub gateway: Arc<RelayGateway>,
    pub attestations: AttestationVerifier,
    pub balance: BalanceGate,
    pub ledger_store: LedgerStore,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
}

pub struct VerificationOrchestrator {
    gateway: Arc<RelayGateway>,
    attestations: AttestationVerifier,
    balance: BalanceGate,
    ledger_store: LedgerStore,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    params: VerificationParams,
    state: Mutex<OrchestratorState>,
    /// Held across capture and write so snapshots land in capture order.
    persisting: Mutex<()>,
    loaded: OnceCell<()>,
}

impl VerificationOrchestrator {
    pub fn new(collaborators: Collaborators, params: VerificationParams) -> Arc<Self> {
        let Collaborators {
            gateway,
            attestations,
            balance,
            ledger_store,
            clock,
            random,
        } = collaborators;
        Arc::new(Self {
            gateway,
            attestations,
            balance,
            ledger_store,
            clock,
            random,
            params,
            state: Mutex::new(OrchestratorState::default()),
            persisting: Mutex::new(()),
            loaded: OnceCell::new(),
        })
    }

    pub fn params(&self) -> &VerificationParams {
        &self.params
    }

    // ── Inbound messages ──────────────────────────────────────────────

    /// Run one inbound message through the state machine.
    ///
    /// Branches are tried in order: round trip, pending probe, attestation
    /// link, anything else. The last two always end with a status message.
    pub async fn handle_message(&self, msg: InboundMessage) -> MessageOutcome {
        self.ensure_loaded().await;

        match self.gateway.peer_address() {
            Ok(own) if msg.from == own => return self.handle_round_trip(&msg).await,
            Ok(_) => {}
            Err(e) => tracing::error!("cannot resolve own identity: {e}"),
        }

        let pending = self.state.lock().await.probes.is_pending(&msg.from);
        if pending {
            self.notify(&msg.from, BotResponse::VerificationInProgress)
                .await;
            return MessageOutcome::InProgress;
        }

        let outcome = match AttestationUrl::find_in(&msg.body) {
            Some(url) => self.verify_participant(&msg.from, &url).await,
            None => {
                self.notify(&msg.from, BotResponse::Welcome).await;
                MessageOutcome::Unrecognised
            }
        };
        self.send_status(&msg.from).await;
        outcome
    }

    async fn handle_round_trip(&self, msg: &InboundMessage) -> MessageOutcome {
        let Some(participant) = parse_relay_test(&msg.body) else {
            tracing::warn!(body = %msg.body, "self-addressed message without relay target");
            return MessageOutcome::Dropped;
        };

        let score = {
            let mut state = self.state.lock().await;
            match state.probes.complete(&participant) {
                Some(probe) => state.pending_events.push(VerificationEvent::ProbeSucceeded {
                    participant: participant.clone(),
                    probe: probe.id,
                    latency_ms: msg.latency_ms,
                }),
                None => tracing::debug!(peer = %participant, "round trip without pending probe"),
            }
            let score = state
                .ledger
                .add_reward(&participant, self.params.relay_reward);
            state.pending_events.push(VerificationEvent::RewardGranted {
                participant: participant.clone(),
                amount: self.params.relay_reward,
                score,
                reason: RewardReason::Relay,
            });
            score
        };

        tracing::info!(peer = %participant, latency_ms = msg.latency_ms, score, "relay round trip");
        self.notify(
            &participant,
            BotResponse::RelaySucceeded {
                latency_ms: msg.latency_ms,
            },
        )
        .await;
        self.notify(&participant, BotResponse::ScoreUpdated { score })
            .await;
        MessageOutcome::RoundTrip { participant, score }
    }

    async fn verify_participant(&self, from: &PeerAddress, url: &AttestationUrl) -> MessageOutcome {
        self.notify(from, BotResponse::VerifyingAttestation).await;

        let claimed = self.claimed_identity(from);
        let decision = match self.attestations.verify(url, &claimed).await {
            Ok((_, decision)) => decision,
            Err(e) => {
                tracing::warn!(peer = %from, url = %url, "attestation fetch failed: {e}");
                self.record_failure(from).await;
                self.notify(from, BotResponse::AttestationUnreachable).await;
                return MessageOutcome::AttestationUnreachable;
            }
        };
        if let Decision::Invalid { missing } = decision {
            tracing::info!(peer = %from, ?missing, "attestation invalid");
            self.record_failure(from).await;
            self.notify(from, BotResponse::AttestationInvalid { missing })
                .await;
            return MessageOutcome::AttestationInvalid;
        }
        self.notify(from, BotResponse::AttestationValid).await;

        let native = match self.native_address_of(from).await {
            Some(native) => native,
            None => {
                self.record_failure(from).await;
                self.notify(from, BotResponse::BalanceUnavailable).await;
                return MessageOutcome::BalanceUnavailable;
            }
        };
        let check = match self
            .balance
            .check(&native, self.params.balance_threshold)
            .await
        {
            Ok(check) => check,
            Err(e) => {
                tracing::warn!(peer = %from, native = %native, "balance check failed: {e}");
                self.record_failure(from).await;
                self.notify(from, BotResponse::BalanceUnavailable).await;
                return MessageOutcome::BalanceUnavailable;
            }
        };
        if !check.passed {
            tracing::info!(peer = %from, amount = %check.amount, "balance below threshold");
            self.record_failure(from).await;
            self.notify(
                from,
                BotResponse::BalanceTooLow {
                    amount: check.amount,
                    threshold: self.params.balance_threshold,
                },
            )
            .await;
            return MessageOutcome::BalanceTooLow {
                amount: check.amount,
            };
        }

        let score = {
            let mut state = self.state.lock().await;
            let prior = state.ledger.score(from);
            state.ledger.upsert(
                from,
                ParticipantUpdate::verified(
                    &url.canonical(),
                    Some(url.status_id().to_string()),
                    native,
                    self.clock.now(),
                ),
            );
            let score = if prior == 0 {
                let score = state.ledger.add_reward(from, self.params.verified_bonus);
                state.pending_events.push(VerificationEvent::RewardGranted {
                    participant: from.clone(),
                    amount: self.params.verified_bonus,
                    score,
                    reason: RewardReason::Verified,
                });
                score
            } else {
                prior
            };
            state
                .pending_events
                .push(VerificationEvent::ParticipantVerified {
                    participant: from.clone(),
                    balance: check.amount,
                });
            score
        };
        tracing::info!(peer = %from, amount = %check.amount, score, "participant verified");

        let _ = self.snapshot().await;
        self.notify(
            from,
            BotResponse::Verified {
                amount: check.amount,
            },
        )
        .await;
        MessageOutcome::Verified {
            amount: check.amount,
            score,
        }
    }

    /// Cached chain address of a participant, derived through the gateway on
    /// first use.
    async fn native_address_of(&self, peer: &PeerAddress) -> Option<NativeAddress> {
        let cached = self
            .state
            .lock()
            .await
            .ledger
            .get(peer)
            .and_then(|p| p.native_address.clone());
        if cached.is_some() {
            return cached;
        }
        match self.gateway.native_address_of(peer).await {
            Ok(native) => Some(native),
            Err(e) => {
                tracing::warn!(peer = %peer, "cannot derive chain address: {e}");
                None
            }
        }
    }

    async fn record_failure(&self, participant: &PeerAddress) {
        self.state
            .lock()
            .await
            .pending_events
            .push(VerificationEvent::VerificationFailed {
                participant: participant.clone(),
            });
    }

    async fn send_status(&self, to: &PeerAddress) {
        let status = {
            let state = self.state.lock().await;
            BotResponse::Status {
                verified: state.ledger.is_verified(to),
                score: state.ledger.score(to),
                probe_pending: state.probes.is_pending(to),
            }
        };
        self.notify(to, status).await;
    }

    /// Fire-and-forget notification; failures are logged only.
    async fn notify(&self, to: &PeerAddress, response: BotResponse) {
        let body = response.to_string();
        if let Err(e) = self.gateway.send(to, &body, &[]).await {
            tracing::warn!(peer = %to, "notification failed: {e}");
        }
    }

    // ── Probe cycle ───────────────────────────────────────────────────

    /// One tick of the probe cycle: load the ledger on first use, write a
    /// snapshot, then probe one random verified participant.
    pub async fn probe_tick(self: &Arc<Self>) -> TickOutcome {
        if !self.ensure_loaded().await {
            return TickOutcome::LedgerUnavailable;
        }
        let _ = self.snapshot().await;

        let now = self.clock.now();
        if now < self.params.campaign_start {
            tracing::debug!(start = %self.params.campaign_start, "campaign not started, skipping probe");
            return TickOutcome::BeforeCampaign;
        }

        let Some((probe, participant)) = self.select_and_register().await else {
            return TickOutcome::NoCandidate;
        };
        let target = probe.participant.clone();

        match self.start_probe(&participant).await {
            Ok(()) => {
                tracing::info!(peer = %target, probe = %probe.id, "relay probe started");
                TickOutcome::ProbeStarted { participant: target }
            }
            Err(abort) => {
                let reason = abort.reason();
                self.abort_probe(&probe, &reason).await;
                TickOutcome::ProbeAborted {
                    participant: target,
                    reason,
                }
            }
        }
    }

    /// Pick a verified participant without a pending probe and register a
    /// probe for it, all under one lock. The timeout timer is armed here too.
    async fn select_and_register(self: &Arc<Self>) -> Option<(RelayProbe, Participant)> {
        let mut state = self.state.lock().await;
        let candidates: Vec<PeerAddress> = state
            .ledger
            .verified()
            .into_iter()
            .filter(|p| !state.probes.is_pending(p))
            .collect();
        if candidates.is_empty() {
            tracing::debug!("no participant eligible for probing");
            return None;
        }
        let target = &candidates[self.random.index(candidates.len())];
        let participant = state.ledger.get(target)?.clone();

        let probe = match state
            .probes
            .begin(target, self.clock.now(), self.params.probe_timeout)
        {
            Ok(probe) => probe,
            Err(e) => {
                tracing::debug!("skipping probe: {e}");
                return None;
            }
        };

        let this = Arc::clone(self);
        let timed = probe.clone();
        let timeout = self.params.probe_timeout;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            this.on_probe_timeout(&timed).await;
        });
        state
            .probes
            .attach_timer(target, probe.id, timer.abort_handle());
        state.pending_events.push(VerificationEvent::ProbeStarted {
            participant: target.clone(),
            probe: probe.id,
        });
        Some((probe, participant))
    }

    /// Re-check the attestation, announce the probe, open a channel and send
    /// the relay test through the participant back to ourselves.
    async fn start_probe(&self, participant: &Participant) -> Result<(), ProbeAbort> {
        let target = &participant.address;
        let url = participant
            .attestation_url
            .as_deref()
            .and_then(AttestationUrl::parse)
            .ok_or(ProbeAbort::NoAttestation)?;
        let text = self
            .attestations
            .fetch(&url)
            .await
            .map_err(|e| ProbeAbort::AttestationUnreachable(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(ProbeAbort::AttestationEmpty);
        }
        let record = self.attestations.classify(&url, text, &self.claimed_identity(target));
        if !self.attestations.decide(&record).is_valid() {
            return Err(ProbeAbort::AttestationInvalid);
        }

        self.notify(target, BotResponse::Online).await;
        self.gateway
            .open_channel(target, self.params.channel_amount)
            .await
            .map_err(|e| ProbeAbort::Channel(e.to_string()))?;
        let own = self
            .gateway
            .peer_address()
            .map_err(|e| ProbeAbort::Send(e.to_string()))?;
        self.gateway
            .send(&own, &relay_test_body(target), std::slice::from_ref(target))
            .await
            .map_err(|e| ProbeAbort::Send(e.to_string()))?;
        Ok(())
    }

    fn claimed_identity(&self, peer: &PeerAddress) -> String {
        match (&self.params.debug_attestation_identity, self.params.debug) {
            (Some(identity), true) => identity.clone(),
            _ => peer.to_string(),
        }
    }

    async fn abort_probe(&self, probe: &RelayProbe, reason: &str) {
        let aborted = {
            let mut state = self.state.lock().await;
            let aborted = state.probes.abort(&probe.participant, probe.id).is_some();
            if aborted {
                state.pending_events.push(VerificationEvent::ProbeAborted {
                    participant: probe.participant.clone(),
                    probe: probe.id,
                    reason: reason.to_string(),
                });
            }
            aborted
        };
        if !aborted {
            return;
        }
        tracing::info!(peer = %probe.participant, probe = %probe.id, reason, "relay probe aborted");
        if self.params.debug {
            self.notify(
                &probe.participant,
                BotResponse::ProbeAborted {
                    reason: reason.to_string(),
                },
            )
            .await;
        }
    }

    async fn on_probe_timeout(&self, probe: &RelayProbe) {
        let expired = {
            let mut state = self.state.lock().await;
            let expired = state.probes.expire(&probe.participant, probe.id);
            if let Some(expired) = &expired {
                state.pending_events.push(VerificationEvent::ProbeTimedOut {
                    participant: expired.participant.clone(),
                    probe: expired.id,
                });
            }
            expired
        };
        if expired.is_none() {
            return;
        }
        tracing::info!(peer = %probe.participant, probe = %probe.id, "relay probe timed out");
        self.notify(&probe.participant, BotResponse::RelayTimedOut)
            .await;
    }

    /// Cancel every pending probe and its timer. Used on shutdown.
    pub async fn cancel_probes(&self) -> usize {
        self.state.lock().await.probes.cancel_all().len()
    }

    // ── Ledger ────────────────────────────────────────────────────────

    /// Load persisted participants once. Returns false while loading keeps
    /// failing; the next caller retries.
    async fn ensure_loaded(&self) -> bool {
        let result = self
            .loaded
            .get_or_try_init(|| async {
                let persisted = self.ledger_store.load().await?;
                let count = persisted.len();
                self.state.lock().await.ledger.merge_persisted(persisted);
                tracing::info!(participants = count, "ledger ready");
                Ok::<(), LedgerError>(())
            })
            .await;
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("ledger load failed, will retry: {e}");
                false
            }
        }
    }

    /// Write a snapshot of the ledger and chain metadata. Failures are
    /// logged and recorded; in-memory state stays authoritative.
    pub async fn snapshot(&self) -> Result<(), LedgerError> {
        if self.loaded.get().is_none() {
            tracing::warn!("ledger not loaded yet, skipping snapshot");
            return Ok(());
        }
        let _persisting = self.persisting.lock().await;
        let metadata = self.collect_metadata().await;
        let snapshot = self.state.lock().await.ledger.snapshot(
            &self.params.environment,
            metadata,
            self.clock.now(),
        );
        match self.ledger_store.persist(&snapshot).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("ledger snapshot failed, retrying next tick: {e}");
                self.state
                    .lock()
                    .await
                    .pending_events
                    .push(VerificationEvent::SnapshotFailed {
                        error: e.to_string(),
                    });
                Err(e)
            }
        }
    }

    async fn collect_metadata(&self) -> ChainMetadata {
        let connected_peers = self
            .gateway
            .list_connected_peers()
            .await
            .unwrap_or_else(|e| {
                tracing::debug!("connected peers unavailable: {e}");
                Vec::new()
            });
        let peer_address = self.gateway.peer_address().ok();
        let native_address = self.gateway.native_address().ok();
        let native_balance = match &native_address {
            Some(native) => self
                .balance
                .balance_of(native)
                .await
                .map_err(|e| tracing::debug!("own chain balance unavailable: {e}"))
                .ok(),
            None => None,
        };
        let node_balance = self
            .gateway
            .balance()
            .await
            .map_err(|e| tracing::debug!("node balance unavailable: {e}"))
            .ok();
        ChainMetadata {
            connected_peers,
            peer_address,
            native_address,
            native_balance,
            node_balance,
        }
    }

    // ── Inspection ────────────────────────────────────────────────────

    /// Take the events recorded since the last drain.
    pub async fn drain_events(&self) -> Vec<VerificationEvent> {
        std::mem::take(&mut self.state.lock().await.pending_events)
    }

    pub async fn participant(&self, address: &PeerAddress) -> Option<Participant> {
        self.state.lock().await.ledger.get(address).cloned()
    }

    pub async fn score(&self, address: &PeerAddress) -> u64 {
        self.state.lock().await.ledger.score(address)
    }

    pub async fn pending_probe(&self, address: &PeerAddress) -> Option<RelayProbe> {
        self.state.lock().await.probes.get(address).cloned()
    }

    pub async fn pending_probe_count(&self) -> usize {
        self.state.lock().await.probes.len()
    }

    pub async fn verified_count(&self) -> usize {
        self.state.lock().await.ledger.verified_count()
    }
}
