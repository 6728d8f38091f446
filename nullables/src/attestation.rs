//! Nullable attestation host: canned post texts.

use async_trait::async_trait;
use relaybot_attestation::{AttestationError, AttestationFetcher, FetchOptions};
use std::collections::HashMap;
use std::sync::Mutex;

/// An [`AttestationFetcher`] serving texts registered per URL.
///
/// Unregistered URLs fail with [`AttestationError::Fetch`].
#[derive(Default)]
pub struct NullAttestationFetcher {
    posts: Mutex<HashMap<String, Option<String>>>,
    fetched: Mutex<Vec<String>>,
}

impl NullAttestationFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` for `url`.
    pub fn publish(&self, url: &str, text: impl Into<String>) {
        self.posts
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(text.into()));
    }

    /// Make fetches of `url` fail.
    pub fn fail(&self, url: &str) {
        self.posts.lock().unwrap().insert(url.to_string(), None);
    }

    /// Every URL fetched so far, in order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttestationFetcher for NullAttestationFetcher {
    async fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<String, AttestationError> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.posts.lock().unwrap().get(url) {
            Some(Some(text)) => Ok(text.clone()),
            Some(None) => Err(AttestationError::Fetch(format!("injected failure for {url}"))),
            None => Err(AttestationError::Fetch(format!("no post at {url}"))),
        }
    }
}
