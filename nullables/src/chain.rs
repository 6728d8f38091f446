//! Nullable chain provider: configurable balances.

use async_trait::async_trait;
use relaybot_balance::{BalanceError, ChainProvider};
use relaybot_types::{Amount, NativeAddress};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A [`ChainProvider`] answering from an in-memory balance table.
///
/// Unknown addresses hold zero.
#[derive(Default)]
pub struct NullChain {
    balances: Mutex<HashMap<NativeAddress, Amount>>,
    failing: AtomicBool,
    queries: AtomicUsize,
}

impl NullChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: &NativeAddress, amount: Amount) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.clone(), amount);
    }

    /// Make every subsequent query fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainProvider for NullChain {
    async fn balance_of(&self, address: &NativeAddress) -> Result<Amount, BalanceError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(BalanceError::Provider("injected provider failure".into()));
        }
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(Amount::ZERO))
    }
}
