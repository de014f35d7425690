//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the funding engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Ledger network settings (Horizon URL, passphrase, faucet).
    pub network: NetworkConfig,

    /// Issuer key custody settings.
    pub custody: CustodyConfig,

    /// Bounded-retry tuning.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Wallet provider settings.
    pub wallets: WalletConfig,
}

/// Which public ledger network the engine talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    /// Test network: faucet funding available.
    #[default]
    Testnet,
    /// Production network: issuer funding is a manual operation.
    Public,
}

impl NetworkKind {
    /// True when faucet funding is permitted.
    pub fn is_test(&self) -> bool {
        matches!(self, NetworkKind::Testnet)
    }
}

/// Ledger network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network kind (testnet or public).
    pub kind: NetworkKind,

    /// Base URL of the Horizon-style ledger API.
    pub horizon_url: String,

    /// Network passphrase baked into every envelope hash.
    pub passphrase: String,

    /// Faucet endpoint for funding new accounts (test network only).
    pub friendbot_url: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            kind: NetworkKind::Testnet,
            horizon_url: "https://horizon-testnet.stellar.org".to_string(),
            passphrase: "Test SDF Network ; September 2015".to_string(),
            friendbot_url: Some("https://friendbot.stellar.org".to_string()),
        }
    }
}

/// Issuer key custody configuration.
///
/// The master key is held outside any persisted record: either in the named
/// environment variable (preferred) or inline for development setups.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CustodyConfig {
    /// Environment variable holding the hex-encoded 32-byte master key.
    pub master_key_env: String,

    /// Inline hex master key. Overrides the environment variable when set;
    /// development use only.
    pub master_key_hex: Option<String>,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            master_key_env: "FUNDING_ENGINE_MASTER_KEY".to_string(),
            master_key_hex: None,
        }
    }
}

/// Bounded-retry tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts when confirming trustline settlement.
    pub trustline_attempts: u32,

    /// Interval between trustline confirmation attempts, in milliseconds.
    pub trustline_interval_ms: u64,

    /// Attempts when detecting an extension-injected wallet provider.
    pub detect_attempts: u32,

    /// Interval between detection attempts, in milliseconds.
    pub detect_interval_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            trustline_attempts: 3,
            trustline_interval_ms: 2000,
            detect_attempts: 25,
            detect_interval_ms: 200,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-request timeout for Horizon calls, in seconds.
    pub horizon_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { horizon_secs: 10 }
    }
}

/// Wallet provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Provider id selected when the caller does not name one.
    pub default_provider: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            default_provider: "extension".to_string(),
        }
    }
}
