//! Chain provider port and the JSON-RPC implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use relaybot_types::{Amount, NativeAddress};
use serde::Deserialize;
use serde_json::json;

use crate::BalanceError;

/// Default timeout for provider requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read access to live chain balances.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Native token balance of `address` at the latest block.
    async fn balance_of(&self, address: &NativeAddress) -> Result<Amount, BalanceError>;
}

/// Ethereum-style JSON-RPC provider (`eth_getBalance`).
pub struct JsonRpcProvider {
    endpoint: String,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl JsonRpcProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            endpoint: endpoint.into(),
            http_client,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub(crate) fn parse_quantity(raw: &str) -> Result<Amount, BalanceError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| BalanceError::InvalidResponse(format!("quantity without 0x: {raw:?}")))?;
    if digits.is_empty() {
        return Err(BalanceError::InvalidResponse("empty quantity".into()));
    }
    u128::from_str_radix(digits, 16)
        .map(Amount::new)
        .map_err(|e| BalanceError::InvalidResponse(format!("quantity {raw:?}: {e}")))
}

#[async_trait]
impl ChainProvider for JsonRpcProvider {
    async fn balance_of(&self, address: &NativeAddress) -> Result<Amount, BalanceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_getBalance",
            "params": [address.as_str(), "latest"],
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| BalanceError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BalanceError::Provider(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| BalanceError::InvalidResponse(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(BalanceError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = body
            .result
            .ok_or_else(|| BalanceError::InvalidResponse("missing result".into()))?;
        parse_quantity(&result)
    }
}
