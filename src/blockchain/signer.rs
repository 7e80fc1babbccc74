//! Signers: account-bound handles that read, submit and confirm contract calls.
//!
//! # Responsibilities
//! - Execute read-only calls (`eth_call`) on behalf of an account
//! - Submit state-changing calls through the wallet provider
//! - Wait for inclusion of submitted calls
//!
//! Nonce assignment is left to the provider in every mode.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::blockchain::types::{ConfirmationStatus, ContractCall, MarketError, MarketResult};
use crate::config::InclusionConfig;
use crate::observability::metrics;

/// An authorization handle bound to one account.
///
/// Implementations never hold session state; they are recreated on every connect.
pub trait ContractSigner: Clone + Send + Sync + 'static {
    /// The account this signer acts for.
    fn address(&self) -> Address;

    /// Execute a read-only call and return the raw return data.
    fn call(&self, call: ContractCall) -> impl Future<Output = MarketResult<Bytes>> + Send;

    /// Submit a state-changing call and return its transaction hash.
    fn send(&self, call: ContractCall) -> impl Future<Output = MarketResult<TxHash>> + Send;

    /// Suspend until the transaction is included (or reverted).
    fn wait_for_inclusion(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = MarketResult<ConfirmationStatus>> + Send;
}

/// Signer backed by a JSON-RPC wallet provider.
#[derive(Clone)]
pub struct RpcSigner {
    account: Address,
    provider: Arc<dyn Provider + Send + Sync>,
    poll_interval: Duration,
    confirmation_blocks: u32,
}

impl RpcSigner {
    /// Create a signer for `account` over an already-configured provider.
    pub fn new(
        account: Address,
        provider: Arc<dyn Provider + Send + Sync>,
        inclusion: &InclusionConfig,
    ) -> Self {
        Self {
            account,
            provider,
            poll_interval: Duration::from_millis(inclusion.poll_interval_ms.max(1)),
            confirmation_blocks: inclusion.confirmation_blocks,
        }
    }

    fn request(&self, call: ContractCall) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.account)
            .with_to(call.to)
            .with_input(call.input)
            .with_value(call.value)
    }
}

impl ContractSigner for RpcSigner {
    fn address(&self) -> Address {
        self.account
    }

    async fn call(&self, call: ContractCall) -> MarketResult<Bytes> {
        let tx = self.request(call);
        self.provider
            .call(tx)
            .await
            .map_err(MarketError::from_transport)
    }

    async fn send(&self, call: ContractCall) -> MarketResult<TxHash> {
        let tx = self.request(call);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(MarketError::from_transport)?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, from = %self.account, "Transaction submitted");
        Ok(tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> MarketResult<ConfirmationStatus> {
        let mut ticker = interval(self.poll_interval);

        loop {
            ticker.tick().await;

            let receipt = match self
                .provider
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(MarketError::from_transport)?
            {
                Some(r) => r,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
            };

            if !receipt.status() {
                metrics::record_inclusion(false);
                return Ok(ConfirmationStatus::Reverted(format!(
                    "transaction {tx_hash} reverted"
                )));
            }

            let current_block = self
                .provider
                .get_block_number()
                .await
                .map_err(MarketError::from_transport)?;
            let tx_block = receipt.block_number.unwrap_or(current_block);
            let confirmations = confirmation_depth(current_block, tx_block);

            if confirmations >= u64::from(self.confirmation_blocks) {
                metrics::record_inclusion(true);
                return Ok(ConfirmationStatus::Confirmed {
                    block_number: tx_block,
                });
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = confirmations,
                required = self.confirmation_blocks,
                "Waiting for confirmations"
            );
        }
    }
}

impl std::fmt::Debug for RpcSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcSigner")
            .field("account", &self.account)
            .field("poll_interval", &self.poll_interval)
            .field("confirmation_blocks", &self.confirmation_blocks)
            .finish()
    }
}

/// Blocks on top of the inclusion block, counting the inclusion block itself.
fn confirmation_depth(current_block: u64, tx_block: u64) -> u64 {
    current_block.saturating_sub(tx_block).saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};
    use alloy::providers::ProviderBuilder;

    fn signer() -> RpcSigner {
        let url: url::Url = "http://localhost:8545".parse().unwrap();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url);
        RpcSigner::new(
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            Arc::new(provider),
            &InclusionConfig::default(),
        )
    }

    #[test]
    fn test_request_carries_from_and_value() {
        let signer = signer();
        let to = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        let tx = signer.request(ContractCall {
            to,
            input: Bytes::from_static(&[1, 2, 3, 4]),
            value: U256::from(5u64),
        });
        assert_eq!(tx.from, Some(signer.address()));
        assert_eq!(tx.value, Some(U256::from(5u64)));
        assert_eq!(tx.input.input().map(|b| b.as_ref()), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_confirmation_depth() {
        assert_eq!(confirmation_depth(100, 100), 1);
        assert_eq!(confirmation_depth(105, 100), 6);
        // A receipt from ahead of the node's head still counts as included.
        assert_eq!(confirmation_depth(99, 100), 1);
        assert_eq!(confirmation_depth(u64::MAX, 0), u64::MAX);
        assert!(confirmation_depth(u64::from(u32::MAX) + 10, 0) > u64::from(u32::MAX));
    }

    #[test]
    fn test_debug_hides_provider() {
        let rendered = format!("{:?}", signer());
        assert!(rendered.contains("RpcSigner"));
        assert!(rendered.contains("account"));
    }
}
