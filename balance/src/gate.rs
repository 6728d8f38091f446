//! The balance threshold check.

use std::sync::Arc;

use relaybot_types::{Amount, NativeAddress};

use crate::provider::ChainProvider;
use crate::BalanceError;

/// Result of a balance check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceCheck {
    pub amount: Amount,
    pub passed: bool,
}

pub struct BalanceGate {
    provider: Arc<dyn ChainProvider>,
}

impl BalanceGate {
    pub fn new(provider: Arc<dyn ChainProvider>) -> Self {
        Self { provider }
    }

    /// Query the live balance of `address`; passes when it is at least
    /// `threshold`.
    pub async fn check(
        &self,
        address: &NativeAddress,
        threshold: Amount,
    ) -> Result<BalanceCheck, BalanceError> {
        let amount = self.provider.balance_of(address).await?;
        let passed = amount >= threshold;
        tracing::debug!(%address, %amount, %threshold, passed, "balance checked");
        Ok(BalanceCheck { amount, passed })
    }

    /// Balance without a threshold, for status reporting.
    pub async fn balance_of(&self, address: &NativeAddress) -> Result<Amount, BalanceError> {
        self.provider.balance_of(address).await
    }
}
