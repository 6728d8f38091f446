use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger persistence failed: {0}")]
    Persistence(#[from] relaybot_store::StoreError),

    #[error("ledger record {record} is malformed: {source}")]
    Serialization {
        record: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid score restore source environment: {0}")]
    InvalidSourceEnvironment(String),
}
