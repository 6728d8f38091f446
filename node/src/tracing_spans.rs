//! Pre-built [`tracing::Span`] constructors for the bot's operations.
//!
//! Consistent span names and fields make it easy to filter and correlate
//! the handling of one participant across log lines.

use tracing::{info_span, Span};

/// Span covering the handling of a single inbound relay message.
pub fn inbound_message_span(peer: &str, latency_ms: u64) -> Span {
    info_span!("inbound_message", peer = %peer, latency_ms)
}

/// Span covering one tick of the probe cycle.
pub fn probe_span(tick: u64) -> Span {
    info_span!("probe_tick", tick)
}

/// Span covering a ledger snapshot write.
pub fn snapshot_span(environment: &str) -> Span {
    info_span!("snapshot", environment = %environment)
}
