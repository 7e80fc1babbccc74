//! Wallet session lifecycle.
//!
//! # Data Flow
//! ```text
//! startup    → initialize_from_existing_grant (eth_accounts, no prompt)
//! connect    → eth_requestAccounts → signer → bind → swap in Connected
//! disconnect → swap in Disconnected
//!
//! controllers: ticket() at issue ... is_current(ticket) at resolution
//! ```
//!
//! # Design Decisions
//! - One `SessionContext` per process, shared through `Arc` and passed to controllers
//! - Sessions are immutable snapshots replaced wholesale (`ArcSwap`)
//! - Disconnect never cancels in-flight calls

pub mod context;
pub mod state;

pub use context::SessionContext;
pub use state::{Connection, Session, SessionTicket};
