//! Prometheus metrics for the relay bot.
//!
//! Counters, gauges and a latency histogram covering message handling,
//! verification and the probe cycle. [`BotMetrics`] owns a dedicated
//! [`Registry`]; [`BotMetrics::encode`] renders it in the Prometheus text
//! exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};
use relaybot_verification::VerificationEvent;

/// Central collection of all bot-level Prometheus metrics.
pub struct BotMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Inbound relay messages handed to the orchestrator.
    pub messages_handled: IntCounter,
    pub verifications_passed: IntCounter,
    pub verifications_failed: IntCounter,
    pub probes_started: IntCounter,
    pub probes_succeeded: IntCounter,
    pub probes_timed_out: IntCounter,
    /// Probes that could not be started (no penalty applied).
    pub probes_aborted: IntCounter,
    /// Sum of score points granted.
    pub rewards_granted: IntCounter,
    pub snapshot_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub verified_participants: IntGauge,
    pub pending_probes: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Relay round-trip latency, in milliseconds.
    pub relay_latency_ms: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntCounter> {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntGauge> {
    register_int_gauge_with_registry!(Opts::new(name, help), registry)
}

impl BotMetrics {
    /// Create a fresh set of metrics, all registered under a new [`Registry`].
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let messages_handled = counter(
            &registry,
            "relaybot_messages_handled_total",
            "Inbound relay messages handled",
        )?;
        let verifications_passed = counter(
            &registry,
            "relaybot_verifications_passed_total",
            "Participants admitted to the ledger",
        )?;
        let verifications_failed = counter(
            &registry,
            "relaybot_verifications_failed_total",
            "Verification attempts rejected by the attestation or balance checks",
        )?;
        let probes_started = counter(
            &registry,
            "relaybot_probes_started_total",
            "Relay probes registered",
        )?;
        let probes_succeeded = counter(
            &registry,
            "relaybot_probes_succeeded_total",
            "Relay probes that completed a round trip",
        )?;
        let probes_timed_out = counter(
            &registry,
            "relaybot_probes_timed_out_total",
            "Relay probes that hit their deadline",
        )?;
        let probes_aborted = counter(
            &registry,
            "relaybot_probes_aborted_total",
            "Relay probes that could not be started",
        )?;
        let rewards_granted = counter(
            &registry,
            "relaybot_rewards_granted_total",
            "Score points granted to participants",
        )?;
        let snapshot_failures = counter(
            &registry,
            "relaybot_snapshot_failures_total",
            "Ledger snapshot writes that failed",
        )?;

        let verified_participants = gauge(
            &registry,
            "relaybot_verified_participants",
            "Participants currently verified",
        )?;
        let pending_probes = gauge(
            &registry,
            "relaybot_pending_probes",
            "Relay probes awaiting a round trip",
        )?;

        let latency_buckets = prometheus::exponential_buckets(10.0, 2.0, 14)?;
        let relay_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "relaybot_relay_latency_ms",
                "Relay round-trip latency in milliseconds"
            )
            .buckets(latency_buckets),
            registry
        )?;

        Ok(Self {
            registry,
            messages_handled,
            verifications_passed,
            verifications_failed,
            probes_started,
            probes_succeeded,
            probes_timed_out,
            probes_aborted,
            rewards_granted,
            snapshot_failures,
            verified_participants,
            pending_probes,
            relay_latency_ms,
        })
    }

    /// Fold one orchestrator event into the counters.
    pub fn observe(&self, event: &VerificationEvent) {
        match event {
            VerificationEvent::ParticipantVerified { .. } => self.verifications_passed.inc(),
            VerificationEvent::VerificationFailed { .. } => self.verifications_failed.inc(),
            VerificationEvent::ProbeStarted { .. } => self.probes_started.inc(),
            VerificationEvent::ProbeSucceeded { latency_ms, .. } => {
                self.probes_succeeded.inc();
                self.relay_latency_ms.observe(*latency_ms as f64);
            }
            VerificationEvent::ProbeTimedOut { .. } => self.probes_timed_out.inc(),
            VerificationEvent::ProbeAborted { .. } => self.probes_aborted.inc(),
            VerificationEvent::RewardGranted { amount, .. } => self.rewards_granted.inc_by(*amount),
            VerificationEvent::SnapshotFailed { .. } => self.snapshot_failures.inc(),
        }
    }

    pub fn set_population(&self, verified: usize, pending_probes: usize) {
        self.verified_participants.set(verified as i64);
        self.pending_probes.set(pending_probes as i64);
    }

    /// Prometheus text exposition of every registered metric.
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_types::{Amount, PeerAddress};
    use relaybot_verification::{ProbeId, RewardReason};

    fn peer() -> PeerAddress {
        PeerAddress::parse("16Uiu2HAmMetricsPeer1111111111111111111111111111111111").unwrap()
    }

    #[test]
    fn events_drive_counters() {
        let metrics = BotMetrics::new().unwrap();
        metrics.observe(&VerificationEvent::ParticipantVerified {
            participant: peer(),
            balance: Amount::whole(2),
        });
        metrics.observe(&VerificationEvent::RewardGranted {
            participant: peer(),
            amount: 10,
            score: 10,
            reason: RewardReason::Verified,
        });
        metrics.observe(&VerificationEvent::ProbeSucceeded {
            participant: peer(),
            probe: ProbeId(1),
            latency_ms: 250,
        });

        assert_eq!(metrics.verifications_passed.get(), 1);
        assert_eq!(metrics.rewards_granted.get(), 10);
        assert_eq!(metrics.probes_succeeded.get(), 1);
        assert_eq!(metrics.relay_latency_ms.get_sample_count(), 1);
    }

    #[test]
    fn encode_includes_metric_names() {
        let metrics = BotMetrics::new().unwrap();
        metrics.set_population(3, 1);
        let text = metrics.encode().unwrap();
        assert!(text.contains("relaybot_verified_participants 3"));
        assert!(text.contains("relaybot_pending_probes 1"));
        assert!(text.contains("relaybot_messages_handled_total"));
    }
}
