//! Contract binding: the fixed marketplace deployment plus a signer.
//!
//! # Data Flow
//! ```text
//! [deployment] config (address, optional ABI file)
//!     → Deployment::load (parse, verify selectors)   once, at startup
//!     → BindingFactory::bind(signer)                  pure, no network
//!     → BoundContract (typed calls)                   owned by the session
//! ```

use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, Bytes, Selector, TxHash, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::blockchain::signer::ContractSigner;
use crate::blockchain::types::{
    ConfirmationStatus, ContractCall, FarmerDetails, MarketError, MarketResult, Product,
};
use crate::config::loader::ConfigError;
use crate::config::DeploymentConfig;
use crate::observability::metrics;

sol! {
    /// Marketplace contract interface.
    interface IFarmXchange {
        function registerFarmer(string memory name) external;
        function getFarmerDetails(address farmer) external view returns (string memory name, bool isRegistered);
        function getFarmerCount() external view returns (uint256);
        function getProductCount() external view returns (uint256);
        function getProduct(uint256 id) external view returns (string memory name, uint256 price, uint256 quantity, string memory ipfsHash, address farmer);
        function addProduct(string memory name, uint256 price, uint256 quantity, string memory ipfsHash) external;
        function updateProduct(uint256 id, uint256 price, uint256 quantity, string memory ipfsHash) external;
        function purchaseProduct(uint256 id, uint256 quantity) external payable;
    }
}

/// Name, signature and selector of every method the client calls.
pub fn required_methods() -> [(&'static str, &'static str, [u8; 4]); 8] {
    use IFarmXchange::*;
    [
        ("registerFarmer", registerFarmerCall::SIGNATURE, registerFarmerCall::SELECTOR),
        ("getFarmerDetails", getFarmerDetailsCall::SIGNATURE, getFarmerDetailsCall::SELECTOR),
        ("getFarmerCount", getFarmerCountCall::SIGNATURE, getFarmerCountCall::SELECTOR),
        ("getProductCount", getProductCountCall::SIGNATURE, getProductCountCall::SELECTOR),
        ("getProduct", getProductCall::SIGNATURE, getProductCall::SELECTOR),
        ("addProduct", addProductCall::SIGNATURE, addProductCall::SELECTOR),
        ("updateProduct", updateProductCall::SIGNATURE, updateProductCall::SELECTOR),
        ("purchaseProduct", purchaseProductCall::SIGNATURE, purchaseProductCall::SELECTOR),
    ]
}

/// Check that a JSON ABI declares every required method with the expected selector.
///
/// Returns the signatures that are missing or mismatched.
pub fn verify_abi(abi: &JsonAbi) -> Result<(), Vec<&'static str>> {
    let missing: Vec<&'static str> = required_methods()
        .into_iter()
        .filter(|(name, _, selector)| {
            !abi.function(name).is_some_and(|overloads| {
                overloads
                    .iter()
                    .any(|f| f.selector() == Selector::from(*selector))
            })
        })
        .map(|(_, signature, _)| signature)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

/// The fixed marketplace deployment: address and verified interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    address: Address,
    chain_id: u64,
    /// Source of the interface description (ABI file path or built-in).
    interface: String,
}

impl Deployment {
    /// Deployment using the built-in interface.
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self {
            address,
            chain_id,
            interface: "built-in".to_string(),
        }
    }

    /// Load the deployment from configuration, verifying the ABI file when one is set.
    pub fn load(config: &DeploymentConfig) -> Result<Self, ConfigError> {
        let address: Address = config.contract_address.parse().map_err(|e| {
            ConfigError::Deployment(format!(
                "Invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;

        let mut deployment = Self::new(address, config.chain_id);

        if let Some(path) = &config.abi_path {
            let abi = load_abi(Path::new(path))?;
            verify_abi(&abi).map_err(|missing| {
                ConfigError::Deployment(format!(
                    "ABI {} is missing methods: {}",
                    path,
                    missing.join(", ")
                ))
            })?;
            deployment.interface = path.clone();
        }

        tracing::info!(
            address = %deployment.address,
            chain_id = deployment.chain_id,
            interface = %deployment.interface,
            "Deployment loaded"
        );
        Ok(deployment)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Chain the contract is deployed on; wallets on another chain are refused.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

fn load_abi(path: &Path) -> Result<JsonAbi, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    serde_json::from_str(&content)
        .map_err(|e| ConfigError::Deployment(format!("Invalid ABI {}: {}", path.display(), e)))
}

/// Produces bound handles for the process-wide deployment.
#[derive(Debug, Clone)]
pub struct BindingFactory {
    deployment: Arc<Deployment>,
}

impl BindingFactory {
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment: Arc::new(deployment),
        }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Bind `signer` to the deployment. No network call is made.
    pub fn bind<S: ContractSigner>(&self, signer: S) -> MarketResult<BoundContract<S>> {
        if signer.address() == Address::ZERO {
            return Err(MarketError::InvalidSigner(
                "signer has no account".to_string(),
            ));
        }
        Ok(BoundContract {
            deployment: self.deployment.clone(),
            signer,
        })
    }
}

/// Callable handle on the marketplace contract for one signer.
///
/// Immutable; a new handle is bound whenever the signer changes.
#[derive(Debug, Clone)]
pub struct BoundContract<S> {
    deployment: Arc<Deployment>,
    signer: S,
}

impl<S: ContractSigner> BoundContract<S> {
    pub fn address(&self) -> Address {
        self.deployment.address
    }

    /// The account calls are issued from.
    pub fn account(&self) -> Address {
        self.signer.address()
    }

    async fn read<C: SolCall>(&self, call: C) -> MarketResult<C::Return> {
        let result = self
            .signer
            .call(ContractCall {
                to: self.deployment.address,
                input: Bytes::from(call.abi_encode()),
                value: U256::ZERO,
            })
            .await;
        metrics::record_remote_call(C::SIGNATURE, result.is_ok());

        let output = result?;
        C::abi_decode_returns(&output).map_err(|e| {
            MarketError::RemoteCallFailed(format!("cannot decode {}: {}", C::SIGNATURE, e))
        })
    }

    async fn write<C: SolCall>(&self, call: C, value: U256) -> MarketResult<PendingWrite<S>> {
        let result = self
            .signer
            .send(ContractCall {
                to: self.deployment.address,
                input: Bytes::from(call.abi_encode()),
                value,
            })
            .await;
        metrics::record_remote_call(C::SIGNATURE, result.is_ok());

        Ok(PendingWrite {
            tx_hash: result?,
            method: C::SIGNATURE,
            signer: self.signer.clone(),
        })
    }

    pub async fn register_farmer(&self, name: &str) -> MarketResult<PendingWrite<S>> {
        let call = IFarmXchange::registerFarmerCall {
            name: name.to_string(),
        };
        self.write(call, U256::ZERO).await
    }

    pub async fn get_farmer_details(&self, farmer: Address) -> MarketResult<FarmerDetails> {
        let details = self
            .read(IFarmXchange::getFarmerDetailsCall { farmer })
            .await?;
        Ok(FarmerDetails {
            name: details.name,
            is_registered: details.isRegistered,
        })
    }

    pub async fn get_farmer_count(&self) -> MarketResult<U256> {
        self.read(IFarmXchange::getFarmerCountCall {}).await
    }

    pub async fn get_product_count(&self) -> MarketResult<U256> {
        self.read(IFarmXchange::getProductCountCall {}).await
    }

    pub async fn get_product(&self, id: U256) -> MarketResult<Product> {
        let product = self.read(IFarmXchange::getProductCall { id }).await?;
        Ok(Product {
            id,
            name: product.name,
            price: product.price,
            quantity: product.quantity,
            ipfs_hash: product.ipfsHash,
            farmer: product.farmer,
        })
    }

    pub async fn add_product(
        &self,
        name: &str,
        price: U256,
        quantity: U256,
        ipfs_hash: &str,
    ) -> MarketResult<PendingWrite<S>> {
        let call = IFarmXchange::addProductCall {
            name: name.to_string(),
            price,
            quantity,
            ipfsHash: ipfs_hash.to_string(),
        };
        self.write(call, U256::ZERO).await
    }

    pub async fn update_product(
        &self,
        id: U256,
        price: U256,
        quantity: U256,
        ipfs_hash: &str,
    ) -> MarketResult<PendingWrite<S>> {
        let call = IFarmXchange::updateProductCall {
            id,
            price,
            quantity,
            ipfsHash: ipfs_hash.to_string(),
        };
        self.write(call, U256::ZERO).await
    }

    /// Purchase `quantity` units, attaching `value` wei as payment.
    pub async fn purchase_product(
        &self,
        id: U256,
        quantity: U256,
        value: U256,
    ) -> MarketResult<PendingWrite<S>> {
        self.write(IFarmXchange::purchaseProductCall { id, quantity }, value)
            .await
    }
}

/// A submitted state-changing call awaiting inclusion.
#[derive(Debug)]
#[must_use = "a pending write does nothing unless waited on"]
pub struct PendingWrite<S> {
    tx_hash: TxHash,
    method: &'static str,
    signer: S,
}

impl<S: ContractSigner> PendingWrite<S> {
    /// Wait for inclusion. A revert is reported as `RemoteCallFailed`.
    pub async fn wait(self) -> MarketResult<u64> {
        match self.signer.wait_for_inclusion(self.tx_hash).await? {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::info!(
                    tx_hash = %self.tx_hash,
                    method = self.method,
                    block_number = block_number,
                    "Transaction included"
                );
                Ok(block_number)
            }
            ConfirmationStatus::Reverted(reason) => Err(MarketError::RemoteCallFailed(reason)),
        }
    }
}
