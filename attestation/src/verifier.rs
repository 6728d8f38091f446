//! The attestation verifier: fetch, classify and decide in one call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classify::{classify, decide, AttestationFlag, AttestationFlags, Decision};
use crate::client::{AttestationFetcher, FetchOptions};
use crate::error::AttestationError;
use crate::url::AttestationUrl;

#[derive(Clone, Debug)]
pub struct AttestationVerifierConfig {
    pub expected_tag: String,
    pub expected_mention: String,
    pub required: Vec<AttestationFlag>,
    pub fetch: FetchOptions,
}

/// A fetched and classified attestation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRecord {
    pub url: String,
    pub text: String,
    pub flags: AttestationFlags,
}

pub struct AttestationVerifier {
    fetcher: Arc<dyn AttestationFetcher>,
    config: AttestationVerifierConfig,
}

impl AttestationVerifier {
    pub fn new(fetcher: Arc<dyn AttestationFetcher>, config: AttestationVerifierConfig) -> Self {
        Self { fetcher, config }
    }

    /// Raw fetch with the configured options.
    pub async fn fetch(&self, url: &AttestationUrl) -> Result<String, AttestationError> {
        self.fetcher.fetch(&url.canonical(), &self.config.fetch).await
    }

    /// Classify already fetched text.
    pub fn classify(&self, url: &AttestationUrl, text: String, claimed: &str) -> AttestationRecord {
        let flags = classify(
            &text,
            &self.config.expected_tag,
            &self.config.expected_mention,
            claimed,
        );
        AttestationRecord {
            url: url.canonical(),
            text,
            flags,
        }
    }

    pub fn decide(&self, record: &AttestationRecord) -> Decision {
        decide(&record.flags, &self.config.required)
    }

    /// Fetch, classify and decide. `claimed` is the peer address the text must
    /// contain for the same-node flag.
    pub async fn verify(
        &self,
        url: &AttestationUrl,
        claimed: &str,
    ) -> Result<(AttestationRecord, Decision), AttestationError> {
        let text = self.fetch(url).await?;
        let record = self.classify(url, text, claimed);
        let decision = self.decide(&record);
        tracing::debug!(url = %record.url, flags = ?record.flags, valid = decision.is_valid(), "attestation classified");
        Ok((record, decision))
    }
}
