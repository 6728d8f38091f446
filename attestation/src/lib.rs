//! Attestation verifier.
//!
//! A participant proves control of a relay node by publishing a short social
//! media post ("attestation") that carries the campaign tag, mentions the bot
//! account and contains the node's peer address. Verification is three steps:
//!
//! 1. [`fetch`](AttestationFetcher::fetch) the post text
//! 2. [`classify`] the text into [`AttestationFlags`]
//! 3. [`decide`] validity against the configured required flags
//!
//! Fetch failures are transient: callers turn them into a failed verification
//! and the participant simply tries again.

pub mod classify;
pub mod client;
pub mod error;
pub mod url;
pub mod verifier;

pub use classify::{classify, decide, AttestationFlag, AttestationFlags, Decision};
pub use client::{AttestationFetcher, FetchOptions, HttpAttestationFetcher};
pub use error::AttestationError;
pub use url::AttestationUrl;
pub use verifier::{AttestationRecord, AttestationVerifier, AttestationVerifierConfig};
