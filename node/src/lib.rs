//! Relay bot runtime.
//!
//! Hosts the pieces around the verification orchestrator that a running bot
//! needs:
//! - [`BotConfig`]: TOML configuration with defaults and validation
//! - [`RelayBot`]: the message loop and the probe-cycle interval
//! - [`BotMetrics`]: Prometheus counters fed from orchestrator events
//! - structured logging, tracing spans and graceful shutdown

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod shutdown;
pub mod tracing_spans;

pub use bot::{BotServices, RelayBot};
pub use config::BotConfig;
pub use error::BotError;
pub use logging::{init_logging, LogFormat};
pub use metrics::BotMetrics;
pub use shutdown::{ShutdownController, ShutdownSignal};
