//! FarmXchange marketplace client library.

pub mod blockchain;
pub mod config;
pub mod controllers;
pub mod observability;
pub mod session;

pub use config::AppConfig;
pub use session::SessionContext;
