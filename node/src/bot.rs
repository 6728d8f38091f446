//! The relay bot runtime.
//!
//! Wires the gateway, attestation verifier, balance gate and ledger into a
//! [`VerificationOrchestrator`] and drives it from two tasks: the inbound
//! message loop and the probe-cycle interval. Both stop on the shutdown
//! signal; [`RelayBot::stop`] then cancels pending probes and writes a
//! final snapshot.

use std::sync::Arc;

use relaybot_attestation::{AttestationFetcher, AttestationVerifier};
use relaybot_balance::{BalanceGate, ChainProvider};
use relaybot_gateway::{InboundStream, RelayGateway, RelayNode};
use relaybot_ledger::{LedgerStore, RestoreOutcome, ScoreRestore};
use relaybot_store::KeyValueStore;
use relaybot_types::{Clock, RandomSource};
use relaybot_utils::format_duration;
use relaybot_verification::{Collaborators, VerificationOrchestrator};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::config::BotConfig;
use crate::metrics::BotMetrics;
use crate::shutdown::ShutdownController;
use crate::tracing_spans::{inbound_message_span, probe_span, snapshot_span};
use crate::BotError;

/// Outside-world ports the bot runs against.
pub struct BotServices {
    pub node: Arc<dyn RelayNode>,
    pub store: Arc<dyn KeyValueStore>,
    pub chain: Arc<dyn ChainProvider>,
    pub fetcher: Arc<dyn AttestationFetcher>,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
}

pub struct RelayBot {
    config: BotConfig,
    gateway: Arc<RelayGateway>,
    orchestrator: Arc<VerificationOrchestrator>,
    restore: ScoreRestore,
    metrics: Arc<BotMetrics>,
    shutdown: ShutdownController,
    task_handles: Vec<JoinHandle<()>>,
    started: bool,
}

impl RelayBot {
    /// Validate the configuration and assemble the orchestrator. Nothing
    /// touches the network until [`start`](Self::start).
    pub fn new(config: BotConfig, services: BotServices) -> Result<Self, BotError> {
        config.validate()?;
        let params = config.verification_params()?;
        let environment = params.environment.clone();

        let gateway = Arc::new(RelayGateway::new(
            services.node,
            Arc::clone(&services.clock),
        ));
        let collaborators = Collaborators {
            gateway: Arc::clone(&gateway),
            attestations: AttestationVerifier::new(services.fetcher, config.attestation_config()),
            balance: BalanceGate::new(services.chain),
            ledger_store: LedgerStore::new(Arc::clone(&services.store), environment.clone()),
            clock: services.clock,
            random: services.random,
        };
        let restore = ScoreRestore::new(
            services.store,
            config.restore_from_environment.clone(),
            environment,
            config.verified_bonus,
        );
        let orchestrator = VerificationOrchestrator::new(collaborators, params);

        Ok(Self {
            config,
            gateway,
            orchestrator,
            restore,
            metrics: Arc::new(BotMetrics::new()?),
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
            started: false,
        })
    }

    /// Start the gateway, run the one-time score restore and spawn the
    /// message loop and the probe cycle.
    pub async fn start(&mut self) -> Result<(), BotError> {
        if self.started {
            return Err(BotError::AlreadyStarted);
        }
        let inbound = self.gateway.start().await?;

        match self.restore.run().await? {
            RestoreOutcome::Restored { participants } => {
                tracing::info!(participants, "scores restored from previous environment");
            }
            outcome => tracing::debug!(?outcome, "score restore skipped"),
        }

        self.started = true;
        self.task_handles.push(self.spawn_message_loop(inbound));
        self.task_handles.push(self.spawn_probe_cycle());
        tracing::info!(
            environment = %self.config.environment,
            cycle = %format_duration(self.config.verification_cycle_secs),
            "relay bot started"
        );
        Ok(())
    }

    fn spawn_message_loop(&self, mut inbound: InboundStream) -> JoinHandle<()> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let metrics = Arc::clone(&self.metrics);
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut in_flight = JoinSet::new();
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("message loop shutting down");
                        break;
                    }
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = joined {
                            tracing::warn!("message handler failed: {e}");
                        }
                    }
                    msg = inbound.recv() => {
                        let Some(msg) = msg else {
                            tracing::info!("inbound stream closed");
                            break;
                        };
                        metrics.messages_handled.inc();
                        let span = inbound_message_span(msg.from.as_str(), msg.latency_ms);
                        let orchestrator = Arc::clone(&orchestrator);
                        let metrics = Arc::clone(&metrics);
                        in_flight.spawn(
                            async move {
                                let outcome = orchestrator.handle_message(msg).await;
                                tracing::debug!(?outcome, "message handled");
                                publish_events(&orchestrator, &metrics).await;
                            }
                            .instrument(span),
                        );
                    }
                }
            }
            in_flight.shutdown().await;
        })
    }

    fn spawn_probe_cycle(&self) -> JoinHandle<()> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let metrics = Arc::clone(&self.metrics);
        let mut shutdown_rx = self.shutdown.subscribe();
        let cycle = self.config.verification_cycle();

        tokio::spawn(async move {
            // The first tick fires immediately and performs the ledger load.
            let mut interval = tokio::time::interval(cycle);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        tracing::info!("probe cycle shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        tick += 1;
                        let outcome = orchestrator.probe_tick().instrument(probe_span(tick)).await;
                        tracing::debug!(tick, ?outcome, "probe tick");
                        publish_events(&orchestrator, &metrics).await;
                    }
                }
            }
        })
    }

    /// Signal both tasks, wait for them, cancel pending probes and write a
    /// final snapshot.
    pub async fn stop(&mut self) -> Result<(), BotError> {
        tracing::info!("relay bot stopping");
        self.shutdown.shutdown();
        for handle in self.task_handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("task ended abnormally: {e}");
            }
        }
        if !self.started {
            return Ok(());
        }
        self.started = false;

        let cancelled = self.orchestrator.cancel_probes().await;
        if cancelled > 0 {
            tracing::info!(cancelled, "pending relay probes cancelled");
        }
        let result = self
            .orchestrator
            .snapshot()
            .instrument(snapshot_span(&self.config.environment))
            .await;
        publish_events(&self.orchestrator, &self.metrics).await;
        result?;
        tracing::info!("relay bot stopped");
        Ok(())
    }

    /// Start, serve until SIGINT/SIGTERM, then stop.
    pub async fn run_until_signal(&mut self) -> Result<(), BotError> {
        self.start().await?;
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Arc<VerificationOrchestrator> {
        &self.orchestrator
    }

    pub fn gateway(&self) -> &Arc<RelayGateway> {
        &self.gateway
    }

    pub fn metrics(&self) -> &Arc<BotMetrics> {
        &self.metrics
    }

    pub fn shutdown_controller(&self) -> ShutdownController {
        self.shutdown.clone()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

/// Drain orchestrator events into the metrics and log the notable ones.
async fn publish_events(orchestrator: &VerificationOrchestrator, metrics: &BotMetrics) {
    for event in orchestrator.drain_events().await {
        tracing::debug!(?event, "verification event");
        metrics.observe(&event);
    }
    metrics.set_population(
        orchestrator.verified_count().await,
        orchestrator.pending_probe_count().await,
    );
}
