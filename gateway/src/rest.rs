//! [`RelayNode`] adapter for a node exposing a REST + WebSocket API.
//!
//! Endpoints used (relative to `api_url`):
//! - `GET  /account/addresses`            → `{"native": "0x…", "peer": "16Uiu2…"}`
//! - `GET  /account/balances`             → `{"native": "<base units>"}`
//! - `GET  /node/peers`                   → `{"connected": [{"peerId": "…"}]}`
//! - `GET  /peers/{peer}/addresses`       → `{"native": "0x…"}`
//! - `POST /messages`                     ← `{"recipient", "body", "path"}`
//! - `POST /channels`                     ← `{"counterparty", "amount"}` → `{"channelId"}`
//!
//! Inbound payloads arrive as text frames on the WebSocket at `ws_url`.
//! Every request carries the `x-auth-token` header when a token is configured.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use relaybot_types::{Amount, NativeAddress, PeerAddress};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use crate::node::{ChannelId, RelayNode};
use crate::GatewayError;

/// Default timeout for node API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the inbound payload channel.
const INBOUND_CHANNEL_CAPACITY: usize = 1024;

const AUTH_HEADER: &str = "x-auth-token";

#[derive(Clone, Debug)]
pub struct RestRelayNodeConfig {
    pub api_url: String,
    pub ws_url: String,
    pub token: Option<String>,
}

pub struct RestRelayNode {
    config: RestRelayNodeConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AddressesResponse {
    native: String,
    #[serde(default)]
    peer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BalancesResponse {
    native: String,
}

#[derive(Debug, Deserialize)]
struct PeersResponse {
    connected: Vec<PeerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeerEntry {
    peer_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    recipient: &'a str,
    body: &'a str,
    path: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct OpenChannelRequest<'a> {
    counterparty: &'a str,
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenChannelResponse {
    channel_id: String,
}

impl RestRelayNode {
    pub fn new(config: RestRelayNodeConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => req.header(AUTH_HEADER, token),
            None => req,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self
            .authorize(self.http_client.get(self.url(path)))
            .send()
            .await
            .map_err(map_transport)?;
        parse_response(response).await
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let response = self
            .authorize(self.http_client.post(self.url(path)).json(body))
            .send()
            .await
            .map_err(map_transport)?;
        parse_response(response).await
    }
}

fn map_transport(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Transport(format!("request timed out: {e}"))
    } else if e.is_connect() {
        GatewayError::Transport(format!("connection failed: {e}"))
    } else {
        GatewayError::Node(e.to_string())
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    if !response.status().is_success() {
        return Err(GatewayError::Node(format!("HTTP status {}", response.status())));
    }
    response
        .json()
        .await
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

fn parse_amount(raw: &str) -> Result<Amount, GatewayError> {
    raw.parse::<u128>()
        .map(Amount::new)
        .map_err(|e| GatewayError::InvalidResponse(format!("amount {raw:?}: {e}")))
}

fn parse_native(raw: &str) -> Result<NativeAddress, GatewayError> {
    NativeAddress::parse(raw).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl RelayNode for RestRelayNode {
    async fn start(&self) -> Result<mpsc::Receiver<String>, GatewayError> {
        let mut request = self
            .config
            .ws_url
            .as_str()
            .into_client_request()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if let Some(token) = &self.config.token {
            let value =
                HeaderValue::from_str(token).map_err(|e| GatewayError::Node(e.to_string()))?;
            request.headers_mut().insert(AUTH_HEADER, value);
        }
        let (mut ws, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        tracing::info!(url = %self.config.ws_url, "connected to relay node message stream");

        let (tx, rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            while let Some(frame) = ws.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if tx.send(text).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("relay node message stream error: {e}");
                        break;
                    }
                }
            }
            tracing::info!("relay node message stream closed");
        });
        Ok(rx)
    }

    async fn peer_address(&self) -> Result<PeerAddress, GatewayError> {
        let resp: AddressesResponse = self.get_json("/account/addresses").await?;
        let peer = resp
            .peer
            .ok_or_else(|| GatewayError::InvalidResponse("missing peer address".into()))?;
        PeerAddress::parse(&peer).map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    async fn native_address(&self) -> Result<NativeAddress, GatewayError> {
        let resp: AddressesResponse = self.get_json("/account/addresses").await?;
        parse_native(&resp.native)
    }

    async fn native_address_of(&self, peer: &PeerAddress) -> Result<NativeAddress, GatewayError> {
        let resp: AddressesResponse = self
            .get_json(&format!("/peers/{}/addresses", peer.as_str()))
            .await?;
        parse_native(&resp.native)
    }

    async fn send_message(
        &self,
        destination: &PeerAddress,
        payload: String,
        path: &[PeerAddress],
    ) -> Result<(), GatewayError> {
        let body = SendMessageRequest {
            recipient: destination.as_str(),
            body: &payload,
            path: path.iter().map(PeerAddress::as_str).collect(),
        };
        let response = self
            .authorize(self.http_client.post(self.url("/messages")).json(&body))
            .send()
            .await
            .map_err(map_transport)?;
        if !response.status().is_success() {
            return Err(GatewayError::Node(format!("HTTP status {}", response.status())));
        }
        Ok(())
    }

    async fn connected_peers(&self) -> Result<Vec<PeerAddress>, GatewayError> {
        let resp: PeersResponse = self.get_json("/node/peers").await?;
        Ok(resp
            .connected
            .iter()
            .filter_map(|p| PeerAddress::parse(&p.peer_id).ok())
            .collect())
    }

    async fn open_channel(
        &self,
        counterparty: &PeerAddress,
        amount: Amount,
    ) -> Result<ChannelId, GatewayError> {
        let body = OpenChannelRequest {
            counterparty: counterparty.as_str(),
            amount: amount.base_units().to_string(),
        };
        let resp: OpenChannelResponse = self.post_json("/channels", &body).await?;
        Ok(ChannelId(resp.channel_id))
    }

    async fn balance(&self) -> Result<Amount, GatewayError> {
        let resp: BalancesResponse = self.get_json("/account/balances").await?;
        parse_amount(&resp.native)
    }
}
