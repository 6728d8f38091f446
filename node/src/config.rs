//! Bot configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use relaybot_attestation::{AttestationFlag, AttestationVerifierConfig, FetchOptions};
use relaybot_types::{Amount, Environment, Timestamp};
use relaybot_verification::VerificationParams;

use crate::BotError;

/// Configuration for the relay verification bot.
///
/// Can be loaded from a TOML file via [`BotConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid development configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotConfig {
    /// JSON-RPC endpoint of the chain provider used by the balance gate.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    /// Echo probe abort reasons to participants and honour
    /// `debug_attestation_identity`.
    #[serde(default)]
    pub debug: bool,

    /// Seconds between probe-cycle ticks.
    #[serde(default = "default_verification_cycle_secs")]
    pub verification_cycle_secs: u64,

    /// Minimum native balance, in base units.
    #[serde(default = "default_balance_threshold")]
    pub balance_threshold: u64,

    /// Campaign environment name; namespaces every persisted record.
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Unix seconds before which no probes run.
    #[serde(default)]
    pub campaign_start: u64,

    /// Environment to copy scores from on first start.
    #[serde(default)]
    pub restore_from_environment: Option<String>,

    #[serde(default)]
    pub debug_attestation_identity: Option<String>,

    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Score added per successful relay round trip.
    #[serde(default = "default_relay_reward")]
    pub relay_reward: u64,

    /// Score granted on first verification.
    #[serde(default = "default_verified_bonus")]
    pub verified_bonus: u64,

    /// Payment channel size opened to a probed participant, in base units.
    #[serde(default = "default_channel_amount")]
    pub channel_amount: u64,

    #[serde(default = "default_required_attestation_flags")]
    pub required_attestation_flags: Vec<AttestationFlag>,

    #[serde(default = "default_attestation_tag")]
    pub attestation_tag: String,

    #[serde(default = "default_attestation_mention")]
    pub attestation_mention: String,

    /// REST endpoint of the local relay node.
    #[serde(default = "default_node_api_url")]
    pub node_api_url: String,

    /// Websocket endpoint delivering inbound relay payloads.
    #[serde(default = "default_node_ws_url")]
    pub node_ws_url: String,

    #[serde(default)]
    pub node_api_token: Option<String>,

    /// Data directory for the LMDB record store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_provider_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_verification_cycle_secs() -> u64 {
    30
}

fn default_balance_threshold() -> u64 {
    1_000_000_000_000_000
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    60
}

fn default_relay_reward() -> u64 {
    1
}

fn default_verified_bonus() -> u64 {
    10
}

fn default_channel_amount() -> u64 {
    1_000_000_000_000_000_000
}

fn default_required_attestation_flags() -> Vec<AttestationFlag> {
    AttestationFlag::ALL.to_vec()
}

fn default_attestation_tag() -> String {
    "#RelayNetwork".to_string()
}

fn default_attestation_mention() -> String {
    "@relaybot".to_string()
}

fn default_node_api_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

fn default_node_ws_url() -> String {
    "ws://127.0.0.1:3001/api/v2/messages/websocket".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./relaybot_data")
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, BotError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| BotError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, BotError> {
        toml::from_str(s).map_err(|e| BotError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, BotError> {
        toml::to_string_pretty(self).map_err(|e| BotError::Config(e.to_string()))
    }

    /// Reject configurations the bot cannot serve with.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.verification_cycle_secs == 0 {
            return Err(BotError::Config(
                "verification_cycle_secs must be positive".into(),
            ));
        }
        if self.probe_timeout_secs == 0 {
            return Err(BotError::Config("probe_timeout_secs must be positive".into()));
        }
        let destination = self.environment()?;
        if let Some(source) = &self.restore_from_environment {
            let source = Environment::parse(source)
                .map_err(|e| BotError::Config(format!("restore_from_environment: {e}")))?;
            if source == destination {
                return Err(BotError::Config(format!(
                    "restore_from_environment equals environment {destination}"
                )));
            }
        }
        Ok(())
    }

    pub fn environment(&self) -> Result<Environment, BotError> {
        Environment::parse(&self.environment)
            .map_err(|e| BotError::Config(format!("environment: {e}")))
    }

    pub fn verification_cycle(&self) -> Duration {
        Duration::from_secs(self.verification_cycle_secs)
    }

    /// Orchestrator parameters derived from this configuration.
    pub fn verification_params(&self) -> Result<VerificationParams, BotError> {
        let mut params = VerificationParams::new(self.environment()?);
        params.campaign_start = Timestamp::from_secs(self.campaign_start);
        params.probe_timeout = Duration::from_secs(self.probe_timeout_secs);
        params.relay_reward = self.relay_reward;
        params.verified_bonus = self.verified_bonus;
        params.channel_amount = Amount::new(u128::from(self.channel_amount));
        params.balance_threshold = Amount::new(u128::from(self.balance_threshold));
        params.debug = self.debug;
        params.debug_attestation_identity = self.debug_attestation_identity.clone();
        Ok(params)
    }

    pub fn attestation_config(&self) -> AttestationVerifierConfig {
        AttestationVerifierConfig {
            expected_tag: self.attestation_tag.clone(),
            expected_mention: self.attestation_mention.clone(),
            required: self.required_attestation_flags.clone(),
            fetch: FetchOptions::default(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            debug: false,
            verification_cycle_secs: default_verification_cycle_secs(),
            balance_threshold: default_balance_threshold(),
            environment: default_environment(),
            campaign_start: 0,
            restore_from_environment: None,
            debug_attestation_identity: None,
            probe_timeout_secs: default_probe_timeout_secs(),
            relay_reward: default_relay_reward(),
            verified_bonus: default_verified_bonus(),
            channel_amount: default_channel_amount(),
            required_attestation_flags: default_required_attestation_flags(),
            attestation_tag: default_attestation_tag(),
            attestation_mention: default_attestation_mention(),
            node_api_url: default_node_api_url(),
            node_ws_url: default_node_ws_url(),
            node_api_token: None,
            data_dir: default_data_dir(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
