use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttestationError {
    #[error("attestation fetch failed: {0}")]
    Fetch(String),

    #[error("attestation host unreachable: {0}")]
    Unreachable(String),

    #[error("not an attestation URL: {0}")]
    InvalidUrl(String),
}
