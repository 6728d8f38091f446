//! Fundamental types for the relay verification bot.
//!
//! This crate defines the value types shared across every other crate in the
//! workspace: relay and chain addresses, amounts, timestamps, the campaign
//! environment name and the clock and randomness abstractions.

pub mod address;
pub mod amount;
pub mod environment;
pub mod error;
pub mod random;
pub mod time;

pub use address::{NativeAddress, PeerAddress};
pub use amount::Amount;
pub use environment::Environment;
pub use error::TypesError;
pub use random::RandomSource;
pub use time::{Clock, SystemClock, Timestamp};
