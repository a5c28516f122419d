//! Daemon configuration.
//!
//! Loaded from a JSON file pointed at by `SETTLER_CONFIG`; falls back to
//! defaults suitable for a localnet node. The signing key itself never
//! lives in the config file; see [`crate::signer`].

use serde::{Deserialize, Serialize};
use tracing::warn;

/// What drives a settlement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// A pass every `poll_interval_secs`, forever.
    Interval,
    /// A pass only when `POST /run` is received on `http_addr`.
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlerConfig {
    pub rpc_url: String,
    /// Lottery contract address on the target chain.
    pub contract_address: String,
    pub trigger: TriggerMode,
    pub poll_interval_secs: u64,
    /// Path to a file holding the hex-encoded signing key. The
    /// `SETTLER_PRIVATE_KEY` environment variable takes precedence.
    pub key_path: String,
    /// Baseline gas price multiplier for inclusion priority.
    pub fee_multiplier: u64,
    /// How long to poll for a receipt after acknowledgement; 0 disables
    /// the wait entirely (acknowledgement only).
    pub confirm_timeout_secs: u64,
    /// Liveness endpoint bind address; required when trigger = http.
    pub http_addr: Option<String>,
    /// If true, evaluates and logs but does not submit transactions.
    pub dry_run: bool,
}

impl Default for SettlerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            contract_address: "0x5b16f42282b4f16c3fafcc0986b56c6e5d0f4745".to_string(),
            trigger: TriggerMode::Interval,
            poll_interval_secs: 60,
            key_path: "~/.config/syndicate/settler.key".to_string(),
            fee_multiplier: 2,
            confirm_timeout_secs: 30,
            http_addr: Some("0.0.0.0:5000".to_string()),
            dry_run: false,
        }
    }
}

pub fn load_config() -> SettlerConfig {
    let path = std::env::var("SETTLER_CONFIG").unwrap_or_default();
    if !path.is_empty() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            if let Ok(config) = serde_json::from_str::<SettlerConfig>(&contents) {
                return config;
            }
        }
        warn!("Failed to load config from {}, using defaults", path);
    }
    SettlerConfig::default()
}
