//! Marketplace types and error definitions.

use alloy::primitives::{Address, Bytes, U256};
use alloy::transports::{RpcError, TransportError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors that can occur while talking to the wallet or the marketplace contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// No wallet provider is configured or reachable.
    #[error("No wallet provider available: install or configure a wallet")]
    ProviderUnavailable,

    /// The user declined a connection or transaction prompt.
    #[error("Request rejected by user")]
    UserRejected,

    /// A signer that cannot authorize calls was passed to the binding factory.
    #[error("Invalid signer: {0}")]
    InvalidSigner(String),

    /// Malformed decimal currency amount.
    #[error("Invalid amount '{0}': expected a non-negative decimal number")]
    InvalidAmount(String),

    /// Malformed form field (quantity, product id, address).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The wallet is connected to a different chain than the deployment.
    #[error("Wallet is on chain {actual}, but the marketplace is deployed on chain {expected}")]
    WrongChain { expected: u64, actual: u64 },

    /// Action attempted without a connected session.
    #[error("Wallet not connected")]
    NotConnected,

    /// Contract call, submission or inclusion wait failed.
    #[error("Remote call failed: {0}")]
    RemoteCallFailed(String),
}

impl MarketError {
    /// Map a transport error from a contract call or submission.
    ///
    /// A 4001 error response is a user rejection; everything else is a remote failure.
    pub fn from_transport(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) if payload.code == USER_REJECTED_CODE => Self::UserRejected,
            _ => Self::RemoteCallFailed(err.to_string()),
        }
    }

    /// Map a transport error from an account request to the wallet itself.
    ///
    /// Failing to reach the wallet endpoint means there is no usable provider.
    pub fn from_wallet_transport(err: TransportError) -> Self {
        match err {
            RpcError::Transport(_) => Self::ProviderUnavailable,
            other => Self::from_transport(other),
        }
    }
}

/// Result type for marketplace operations.
pub type MarketResult<T> = Result<T, MarketError>;

/// A contract invocation ready for a signer: target, calldata and attached value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
}

/// Outcome of an inclusion wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction included with the required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was included but reverted.
    Reverted(String),
}

/// Farmer record as returned by `getFarmerDetails`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmerDetails {
    pub name: String,
    pub is_registered: bool,
}

/// Product record as returned by `getProduct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: U256,
    pub name: String,
    /// Price in wei.
    pub price: U256,
    pub quantity: U256,
    pub ipfs_hash: String,
    pub farmer: Address,
}
