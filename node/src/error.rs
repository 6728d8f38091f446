use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// Invalid configuration; fatal before serving.
    #[error("config error: {0}")]
    Config(String),

    #[error("relay gateway error: {0}")]
    Gateway(#[from] relaybot_gateway::GatewayError),

    #[error("ledger error: {0}")]
    Ledger(#[from] relaybot_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] relaybot_store::StoreError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bot already started")]
    AlreadyStarted,
}
