//! Fetching attestation text.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AttestationError;

/// Default timeout for attestation requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-request fetch options.
#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Retrieves the text of an externally hosted attestation.
#[async_trait]
pub trait AttestationFetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String, AttestationError>;
}

/// Fetches attestation text over HTTP.
///
/// The body of `GET url` is returned verbatim; classification only looks for
/// substrings, so markup around the post text does no harm.
pub struct HttpAttestationFetcher {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
}

impl HttpAttestationFetcher {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http_client }
    }
}

impl Default for HttpAttestationFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AttestationFetcher for HttpAttestationFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<String, AttestationError> {
        let response = self
            .http_client
            .get(url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AttestationError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    AttestationError::Unreachable(format!("connection failed: {e}"))
                } else {
                    AttestationError::Fetch(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(AttestationError::Fetch(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AttestationError::Fetch(format!("failed to read attestation body: {e}")))
    }
}
