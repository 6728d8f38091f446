use thiserror::Error;

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("chain provider request failed: {0}")]
    Provider(String),

    #[error("chain provider returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response from chain provider: {0}")]
    InvalidResponse(String),
}
