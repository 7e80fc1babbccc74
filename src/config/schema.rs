//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the marketplace client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Wallet provider settings.
    pub wallet: WalletConfig,

    /// Marketplace contract deployment.
    pub deployment: DeploymentConfig,

    /// Inclusion wait settings.
    pub inclusion: InclusionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Wallet provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// When false, the client behaves as if no wallet is installed.
    pub enabled: bool,

    /// JSON-RPC endpoint of the wallet (e.g., "http://localhost:8545").
    pub rpc_url: String,

    /// Environment variable holding a private key. When unset, accounts are
    /// managed by the endpoint itself.
    pub local_key_env: Option<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rpc_url: "http://localhost:8545".to_string(),
            local_key_env: None,
        }
    }
}

/// Contract deployment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Address of the marketplace contract.
    pub contract_address: String,

    /// Optional path to the contract's JSON ABI, verified at startup.
    pub abi_path: Option<String>,

    /// Chain ID (e.g., 31337 for local Anvil).
    pub chain_id: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            // First deployment address of Anvil's default account.
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            abi_path: None,
            chain_id: 31337,
        }
    }
}

/// Inclusion wait configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InclusionConfig {
    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Blocks required, counting the inclusion block (1 = included).
    pub confirmation_blocks: u32,
}

impl Default for InclusionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            confirmation_blocks: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
