//! Validation errors for the shared value types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid peer address: {0}")]
    InvalidPeerAddress(String),

    #[error("invalid native address: {0}")]
    InvalidNativeAddress(String),

    #[error("invalid environment name: {0:?}")]
    InvalidEnvironment(String),
}
