//! Configuration module for the donation pipeline
//!
//! Handles configuration loading from TOML files and environment variables,
//! and provides structured configuration types.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Network endpoint configuration
    pub rpc: RpcConfig,

    /// Wallet configuration
    pub wallet: WalletConfig,

    /// Donation configuration
    pub donation: DonationConfig,

    /// Confirmation monitoring
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_secs: u64,

    /// Commitment level transfers are settled at
    /// ("processed", "confirmed" or "finalized")
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Path to keypair file
    pub keypair_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationConfig {
    /// Owner address donations are sent to
    pub recipient_address: String,

    /// Path to the token catalog file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Interval between status polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on the confirmation wait in seconds, sized to the
    /// anchor's validity window
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

// Default value functions
fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}
fn default_rpc_timeout() -> u64 {
    30
}
fn default_commitment() -> String {
    "processed".to_string()
}
fn default_catalog_path() -> String {
    "tokens.json".to_string()
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_max_wait_secs() -> u64 {
    90
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn commitment(&self) -> anyhow::Result<CommitmentConfig> {
        CommitmentConfig::from_str(&self.commitment)
            .map_err(|_| anyhow::anyhow!("unknown commitment level '{}'", self.commitment))
    }
}

impl ConfirmationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_file(path)
    }

    /// Validate configuration consistency before any component is built
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rpc.url.is_empty() {
            anyhow::bail!("rpc.url must not be empty");
        }
        self.rpc.commitment()?;

        Pubkey::from_str(&self.donation.recipient_address).map_err(|_| {
            anyhow::anyhow!(
                "donation.recipient_address is not a valid address: {}",
                self.donation.recipient_address
            )
        })?;

        if self.confirmation.poll_interval_ms == 0 {
            anyhow::bail!("confirmation.poll_interval_ms must be positive");
        }
        if self.confirmation.max_wait_secs == 0 {
            anyhow::bail!("confirmation.max_wait_secs must be positive");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig {
                url: default_rpc_url(),
                timeout_secs: default_rpc_timeout(),
                commitment: default_commitment(),
            },
            wallet: WalletConfig {
                keypair_path: "wallet.json".to_string(),
            },
            donation: DonationConfig {
                recipient_address: String::new(),
                catalog_path: default_catalog_path(),
            },
            confirmation: ConfirmationConfig::default(),
        }
    }
}
