//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Wallet endpoint / private key env var
//!     → provider.rs (account discovery, connection request, signers)
//!     → signer.rs (eth_call, submission, inclusion wait)
//!     → binding.rs (fixed deployment + signer → typed contract handle)
//! units.rs converts decimal amounts to and from wei for the controllers.
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys
//! - Nonces are assigned by the wallet provider, never by this crate

pub mod binding;
pub mod provider;
pub mod signer;
pub mod types;
pub mod units;

pub use binding::{BindingFactory, BoundContract, Deployment, PendingWrite};
pub use provider::{InjectedWallet, ProviderBridge, RpcWallet};
pub use signer::{ContractSigner, RpcSigner};
pub use types::{MarketError, MarketResult};
