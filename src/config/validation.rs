//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use tracing::level_filters::LevelFilter;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.wallet.enabled {
        if let Err(e) = config.wallet.rpc_url.parse::<url::Url>() {
            errors.push(ValidationError {
                field: "wallet.rpc_url",
                message: format!("invalid URL '{}': {}", config.wallet.rpc_url, e),
            });
        }
        if let Some(var) = &config.wallet.local_key_env {
            if var.trim().is_empty() {
                errors.push(ValidationError {
                    field: "wallet.local_key_env",
                    message: "must name an environment variable".to_string(),
                });
            }
        }
    }

    match config.deployment.contract_address.parse::<Address>() {
        Ok(address) if address == Address::ZERO => errors.push(ValidationError {
            field: "deployment.contract_address",
            message: "must not be the zero address".to_string(),
        }),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError {
            field: "deployment.contract_address",
            message: format!("invalid address '{}': {}", config.deployment.contract_address, e),
        }),
    }

    if config.deployment.chain_id == 0 {
        errors.push(ValidationError {
            field: "deployment.chain_id",
            message: "must be non-zero".to_string(),
        });
    }

    if config.inclusion.poll_interval_ms == 0 {
        errors.push(ValidationError {
            field: "inclusion.poll_interval_ms",
            message: "must be greater than 0".to_string(),
        });
    }

    if config.inclusion.confirmation_blocks == 0 {
        errors.push(ValidationError {
            field: "inclusion.confirmation_blocks",
            message: "must be at least 1".to_string(),
        });
    }

    if config.observability.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!(
                "unknown level '{}', expected one of off, error, warn, info, debug, trace",
                config.observability.log_level
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
