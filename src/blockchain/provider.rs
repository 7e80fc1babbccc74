//! Wallet provider bridge.
//!
//! # Responsibilities
//! - Silent account discovery (`eth_accounts`)
//! - Explicit account requests that may prompt the user (`eth_requestAccounts`)
//! - Hand out signers for granted accounts
//!
//! # Provider kinds
//! - Node-managed accounts: the endpoint owns the keys, signs
//!   `eth_sendTransaction` and assigns nonces
//! - Local key: a private key read from an environment variable acts as the
//!   wallet; its address is the only account and signing happens in-process

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use std::future::Future;
use std::sync::Arc;

use crate::blockchain::signer::{ContractSigner, RpcSigner};
use crate::blockchain::types::{MarketError, MarketResult};
use crate::config::{InclusionConfig, WalletConfig};

/// A wallet the user has installed, able to enumerate and grant accounts.
pub trait InjectedWallet: Send + Sync + 'static {
    /// Signer type produced for granted accounts.
    type Signer: ContractSigner;

    /// Accounts already granted to this application. Never prompts.
    fn accounts(&self) -> impl Future<Output = MarketResult<Vec<Address>>> + Send;

    /// Ask the user to grant account access. May prompt.
    fn request_accounts(&self) -> impl Future<Output = MarketResult<Vec<Address>>> + Send;

    /// Obtain a signer for a granted account.
    fn signer(&self, account: Address) -> impl Future<Output = MarketResult<Self::Signer>> + Send;

    /// Chain the wallet is currently connected to.
    fn chain_id(&self) -> impl Future<Output = MarketResult<u64>> + Send;
}

/// Wraps an optional wallet; `None` means no wallet is installed.
///
/// Holds no session state of its own.
pub struct ProviderBridge<W> {
    wallet: Option<W>,
}

impl<W: InjectedWallet> ProviderBridge<W> {
    pub fn new(wallet: Option<W>) -> Self {
        Self { wallet }
    }

    /// Bridge with no wallet installed.
    pub fn unavailable() -> Self {
        Self { wallet: None }
    }

    pub fn is_available(&self) -> bool {
        self.wallet.is_some()
    }

    /// Accounts already granted, or an empty list when there is no wallet or the query fails.
    pub async fn detect_accounts(&self) -> Vec<Address> {
        let Some(wallet) = &self.wallet else {
            tracing::debug!("No wallet provider present, skipping account detection");
            return Vec::new();
        };

        match wallet.accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::warn!(error = %e, "Account detection failed");
                Vec::new()
            }
        }
    }

    /// Prompt for account access and return the primary account.
    pub async fn request_connection(&self) -> MarketResult<Address> {
        let wallet = self.wallet.as_ref().ok_or(MarketError::ProviderUnavailable)?;
        let accounts = wallet.request_accounts().await?;
        accounts.first().copied().ok_or(MarketError::UserRejected)
    }

    /// Obtain a signer for `account` from the wallet.
    pub async fn signer_for(&self, account: Address) -> MarketResult<W::Signer> {
        let wallet = self.wallet.as_ref().ok_or(MarketError::ProviderUnavailable)?;
        wallet.signer(account).await
    }

    /// Fail with `WrongChain` unless the wallet is on chain `expected`.
    pub async fn ensure_chain(&self, expected: u64) -> MarketResult<()> {
        let wallet = self.wallet.as_ref().ok_or(MarketError::ProviderUnavailable)?;
        let actual = wallet.chain_id().await?;
        if actual != expected {
            tracing::warn!(expected, actual, "Wallet is on the wrong chain");
            return Err(MarketError::WrongChain { expected, actual });
        }
        Ok(())
    }
}

enum KeySource {
    Node,
    Local(PrivateKeySigner),
}

/// Wallet reached over JSON-RPC, with node-managed accounts or a local key.
pub struct RpcWallet {
    url: url::Url,
    provider: Arc<dyn Provider + Send + Sync>,
    keys: KeySource,
    inclusion: InclusionConfig,
}

impl RpcWallet {
    /// Wallet whose accounts are managed by the endpoint.
    pub fn node(url: url::Url, inclusion: InclusionConfig) -> Self {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url.clone());
        Self {
            url,
            provider: Arc::new(provider),
            keys: KeySource::Node,
            inclusion,
        }
    }

    /// Wallet backed by a hex-encoded private key (with or without `0x`).
    ///
    /// The key is never logged.
    pub fn with_local_key(
        url: url::Url,
        private_key_hex: &str,
        inclusion: InclusionConfig,
    ) -> MarketResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| MarketError::InvalidSigner(format!("Invalid private key format: {e}")))?;

        tracing::info!(address = %signer.address(), "Local key wallet initialized");

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url.clone());
        Ok(Self {
            url,
            provider: Arc::new(provider),
            keys: KeySource::Local(signer),
            inclusion,
        })
    }

    /// Build the wallet described by `[wallet]`, or `None` when it is disabled.
    ///
    /// Reads the private key from the configured environment variable when one is set.
    pub fn from_config(
        config: &WalletConfig,
        inclusion: &InclusionConfig,
    ) -> MarketResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            MarketError::InvalidInput(format!("Invalid wallet URL '{}': {}", config.rpc_url, e))
        })?;

        match &config.local_key_env {
            Some(var) => {
                let key = std::env::var(var).map_err(|_| {
                    tracing::warn!(env = %var, "Private key variable not set");
                    MarketError::ProviderUnavailable
                })?;
                Self::with_local_key(url, &key, inclusion.clone()).map(Some)
            }
            None => Ok(Some(Self::node(url, inclusion.clone()))),
        }
    }
}

impl InjectedWallet for RpcWallet {
    type Signer = RpcSigner;

    async fn accounts(&self) -> MarketResult<Vec<Address>> {
        match &self.keys {
            KeySource::Local(signer) => Ok(vec![signer.address()]),
            KeySource::Node => self
                .provider
                .get_accounts()
                .await
                .map_err(MarketError::from_wallet_transport),
        }
    }

    async fn request_accounts(&self) -> MarketResult<Vec<Address>> {
        match &self.keys {
            KeySource::Local(signer) => Ok(vec![signer.address()]),
            KeySource::Node => {
                let accounts: Vec<Address> = self
                    .provider
                    .client()
                    .request_noparams("eth_requestAccounts")
                    .await
                    .map_err(MarketError::from_wallet_transport)?;
                Ok(accounts)
            }
        }
    }

    async fn signer(&self, account: Address) -> MarketResult<RpcSigner> {
        match &self.keys {
            KeySource::Node => Ok(RpcSigner::new(account, self.provider.clone(), &self.inclusion)),
            KeySource::Local(key) => {
                if key.address() != account {
                    return Err(MarketError::InvalidSigner(format!(
                        "account {account} is not held by the local key"
                    )));
                }
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(key.clone()))
                    .connect_http(self.url.clone());
                Ok(RpcSigner::new(account, Arc::new(provider), &self.inclusion))
            }
        }
    }

    async fn chain_id(&self) -> MarketResult<u64> {
        self.provider
            .get_chain_id()
            .await
            .map_err(MarketError::from_wallet_transport)
    }
}

impl std::fmt::Debug for RpcWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.keys {
            KeySource::Node => "node",
            KeySource::Local(_) => "local-key",
        };
        f.debug_struct("RpcWallet")
            .field("url", &self.url.as_str())
            .field("mode", &mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn url() -> url::Url {
        "http://localhost:8545".parse().unwrap()
    }

    #[tokio::test]
    async fn test_local_key_accounts() {
        let wallet =
            RpcWallet::with_local_key(url(), TEST_PRIVATE_KEY, InclusionConfig::default()).unwrap();
        let accounts = wallet.accounts().await.unwrap();
        assert_eq!(
            accounts[0].to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(wallet.request_accounts().await.unwrap(), accounts);
    }

    #[tokio::test]
    async fn test_local_key_with_0x_prefix() {
        let wallet = RpcWallet::with_local_key(
            url(),
            &format!("0x{}", TEST_PRIVATE_KEY),
            InclusionConfig::default(),
        )
        .unwrap();
        let signer = wallet
            .signer(wallet.accounts().await.unwrap()[0])
            .await
            .unwrap();
        assert_eq!(
            signer.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[tokio::test]
    async fn test_local_key_rejects_foreign_account() {
        let wallet =
            RpcWallet::with_local_key(url(), TEST_PRIVATE_KEY, InclusionConfig::default()).unwrap();
        let result = wallet.signer(Address::repeat_byte(0x11)).await;
        assert!(matches!(result, Err(MarketError::InvalidSigner(_))));
    }

    #[test]
    fn test_invalid_private_key() {
        let result = RpcWallet::with_local_key(url(), "invalid_key", InclusionConfig::default());
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_disabled_wallet_is_absent() {
        let config = WalletConfig {
            enabled: false,
            ..WalletConfig::default()
        };
        let wallet = RpcWallet::from_config(&config, &InclusionConfig::default()).unwrap();
        assert!(wallet.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_bridge() {
        let bridge = ProviderBridge::<RpcWallet>::unavailable();
        assert!(!bridge.is_available());
        assert!(bridge.detect_accounts().await.is_empty());
        assert_eq!(
            bridge.request_connection().await,
            Err(MarketError::ProviderUnavailable)
        );
        assert_eq!(
            bridge.ensure_chain(31337).await,
            Err(MarketError::ProviderUnavailable)
        );
    }

    #[tokio::test]
    async fn test_unreachable_node_detects_nothing() {
        // Nothing listens on port 1.
        let wallet = RpcWallet::node("http://127.0.0.1:1".parse().unwrap(), InclusionConfig::default());
        let bridge = ProviderBridge::new(Some(wallet));
        assert!(bridge.detect_accounts().await.is_empty());
        assert_eq!(
            bridge.request_connection().await,
            Err(MarketError::ProviderUnavailable)
        );
        assert_eq!(
            bridge.ensure_chain(31337).await,
            Err(MarketError::ProviderUnavailable)
        );
    }
}
