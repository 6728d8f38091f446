//! Relay gateway for the verification bot.
//!
//! The relay network itself (routing, packet encryption, payment channels) is
//! an external node reached through the [`RelayNode`] port. The gateway adds
//! what the bot needs on top of it:
//! - a start-once guard: every operation fails with
//!   [`GatewayError::NotStarted`] until [`RelayGateway::start`] completes
//! - the relay [`Envelope`] carrying sender and origin timestamp, so the
//!   receiver can compute round-trip latency
//! - decoding of inbound payloads, dropping (and logging) malformed ones

pub mod envelope;
pub mod error;
pub mod gateway;
pub mod node;
pub mod rest;

pub use envelope::Envelope;
pub use error::GatewayError;
pub use gateway::{InboundMessage, InboundStream, RelayGateway, SendAck};
pub use node::{ChannelId, IdentityKind, RelayNode};
pub use rest::{RestRelayNode, RestRelayNodeConfig};
