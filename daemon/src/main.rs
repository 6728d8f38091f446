//! relaybot daemon: entry point for running the relay verification bot.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relaybot_attestation::HttpAttestationFetcher;
use relaybot_balance::JsonRpcProvider;
use relaybot_gateway::{RestRelayNode, RestRelayNodeConfig};
use relaybot_node::{init_logging, BotConfig, BotServices, LogFormat, RelayBot};
use relaybot_store_lmdb::LmdbStore;
use relaybot_types::SystemClock;
use relaybot_verification::ThreadRandom;

/// LMDB map size for the record store.
const LMDB_MAP_SIZE: usize = 256 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "relaybot", about = "Relay network verification bot")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "RELAYBOT_CONFIG")]
    config: Option<PathBuf>,

    /// Campaign environment name.
    #[arg(long, env = "RELAYBOT_ENVIRONMENT")]
    environment: Option<String>,

    /// Copy scores from this environment on first start.
    #[arg(long, env = "RELAYBOT_RESTORE_FROM_ENVIRONMENT")]
    restore_from_environment: Option<String>,

    /// Chain provider JSON-RPC endpoint.
    #[arg(long, env = "RELAYBOT_PROVIDER_URL")]
    provider_url: Option<String>,

    /// Relay node REST endpoint.
    #[arg(long, env = "RELAYBOT_NODE_API_URL")]
    node_api_url: Option<String>,

    /// Relay node websocket endpoint.
    #[arg(long, env = "RELAYBOT_NODE_WS_URL")]
    node_ws_url: Option<String>,

    #[arg(long, env = "RELAYBOT_NODE_API_TOKEN", hide_env_values = true)]
    node_api_token: Option<String>,

    /// Data directory for the LMDB record store.
    #[arg(long, env = "RELAYBOT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Seconds between probe-cycle ticks.
    #[arg(long, env = "RELAYBOT_VERIFICATION_CYCLE")]
    verification_cycle_secs: Option<u64>,

    /// Minimum native balance in base units.
    #[arg(long, env = "RELAYBOT_BALANCE_THRESHOLD")]
    balance_threshold: Option<u64>,

    /// Campaign start, unix seconds.
    #[arg(long, env = "RELAYBOT_CAMPAIGN_START")]
    campaign_start: Option<u64>,

    #[arg(long, env = "RELAYBOT_DEBUG_ATTESTATION_IDENTITY")]
    debug_attestation_identity: Option<String>,

    /// Echo probe abort reasons and honour the debug attestation identity.
    #[arg(long, env = "RELAYBOT_DEBUG")]
    debug: bool,

    /// Log format: "human" or "json".
    #[arg(long, env = "RELAYBOT_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "RELAYBOT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the bot until SIGINT/SIGTERM.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Cli {
    /// Overlay CLI flags and environment variables on `base`.
    fn apply(self, mut base: BotConfig) -> (BotConfig, Command) {
        if let Some(value) = self.environment {
            base.environment = value;
        }
        if let Some(value) = self.provider_url {
            base.provider_url = value;
        }
        if let Some(value) = self.node_api_url {
            base.node_api_url = value;
        }
        if let Some(value) = self.node_ws_url {
            base.node_ws_url = value;
        }
        if let Some(value) = self.data_dir {
            base.data_dir = value;
        }
        if let Some(value) = self.verification_cycle_secs {
            base.verification_cycle_secs = value;
        }
        if let Some(value) = self.balance_threshold {
            base.balance_threshold = value;
        }
        if let Some(value) = self.campaign_start {
            base.campaign_start = value;
        }
        if let Some(value) = self.log_format {
            base.log_format = value;
        }
        if let Some(value) = self.log_level {
            base.log_level = value;
        }
        if self.restore_from_environment.is_some() {
            base.restore_from_environment = self.restore_from_environment;
        }
        if self.node_api_token.is_some() {
            base.node_api_token = self.node_api_token;
        }
        if self.debug_attestation_identity.is_some() {
            base.debug_attestation_identity = self.debug_attestation_identity;
        }
        base.debug |= self.debug;
        (base, self.command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            BotConfig::from_toml_file(&path).with_context(|| format!("loading {path}"))?
        }
        None => BotConfig::default(),
    };
    let (config, command) = cli.apply(file_config);

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level);

    match command {
        Command::Config => {
            println!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Run => run(config).await,
    }
}

async fn run(config: BotConfig) -> anyhow::Result<()> {
    config.validate()?;
    tracing::info!(
        environment = %config.environment,
        node = %config.node_api_url,
        data_dir = %config.data_dir.display(),
        "starting relay bot"
    );

    let store = LmdbStore::open(&config.data_dir, LMDB_MAP_SIZE)
        .with_context(|| format!("opening store in {}", config.data_dir.display()))?;
    let node = RestRelayNode::new(RestRelayNodeConfig {
        api_url: config.node_api_url.clone(),
        ws_url: config.node_ws_url.clone(),
        token: config.node_api_token.clone(),
    });
    let services = BotServices {
        node: Arc::new(node),
        store: Arc::new(store),
        chain: Arc::new(JsonRpcProvider::new(&config.provider_url)),
        fetcher: Arc::new(HttpAttestationFetcher::new()),
        clock: Arc::new(SystemClock),
        random: Arc::new(ThreadRandom),
    };

    let mut bot = RelayBot::new(config, services)?;
    bot.run_until_signal().await?;
    Ok(())
}
