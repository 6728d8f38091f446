//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the bot (clock, relay node, storage, chain
//! provider, attestation host, randomness) is abstracted behind a trait. This
//! crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including failure injection
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod attestation;
pub mod chain;
pub mod clock;
pub mod node;
pub mod random;
pub mod store;

pub use attestation::NullAttestationFetcher;
pub use chain::NullChain;
pub use clock::NullClock;
pub use node::{test_peer, NullRelayNode, SentMessage};
pub use random::NullRandom;
pub use store::NullStore;
