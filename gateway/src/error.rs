use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("relay gateway used before start() completed")]
    NotStarted,

    #[error("relay gateway already started")]
    AlreadyStarted,

    #[error("malformed relay envelope: {0}")]
    Decode(String),

    #[error("relay node rejected the request: {0}")]
    Node(String),

    #[error("relay node unreachable: {0}")]
    Transport(String),

    #[error("invalid response from relay node: {0}")]
    InvalidResponse(String),
}
