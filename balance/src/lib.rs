//! Balance gate.
//!
//! Rewards are only granted to participants whose node account holds at least
//! a configured amount of native token. The gate is stateless and never
//! caches: balances legitimately change between calls, so each check queries
//! the chain at call time.

pub mod error;
pub mod gate;
pub mod provider;

pub use error::BalanceError;
pub use gate::{BalanceCheck, BalanceGate};
pub use provider::{ChainProvider, JsonRpcProvider};
