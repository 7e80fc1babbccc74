//! Conversion between decimal currency amounts and their 18-decimal fixed-point form.
//!
//! # Responsibilities
//! - Validate user-entered amounts before any network call
//! - Scale decimal strings to wei and back
//! - Parse integer form fields (quantities, product ids)

use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::U256;

use crate::blockchain::types::{MarketError, MarketResult};

/// Number of fractional digits in the on-chain representation.
pub const FIXED_POINT_DECIMALS: usize = 18;

/// Parse a non-negative decimal amount (e.g. `"1.5"`) into wei.
pub fn to_fixed_point(amount: &str) -> MarketResult<U256> {
    let invalid = || MarketError::InvalidAmount(amount.to_string());
    let trimmed = amount.trim();

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (trimmed, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }
    if frac_part.len() > FIXED_POINT_DECIMALS {
        return Err(invalid());
    }

    let int_part = int_part.trim_start_matches('0');
    let normalized = format!(
        "{}.{}",
        if int_part.is_empty() { "0" } else { int_part },
        if frac_part.is_empty() { "0" } else { frac_part }
    );

    parse_ether(&normalized).map_err(|_| invalid())
}

/// Format a wei amount as a canonical decimal string.
///
/// Trailing fractional zeros are trimmed but one fractional digit is always kept,
/// so whole amounts render as `"2.0"`.
pub fn from_fixed_point(value: U256) -> String {
    let formatted = format_ether(value);
    match formatted.split_once('.') {
        Some((int_part, frac_part)) => {
            let frac_part = frac_part.trim_end_matches('0');
            if frac_part.is_empty() {
                format!("{int_part}.0")
            } else {
                format!("{int_part}.{frac_part}")
            }
        }
        None => format!("{formatted}.0"),
    }
}

/// Parse a non-negative integer form field such as a quantity or product id.
pub fn parse_quantity(field: &str, value: &str) -> MarketResult<U256> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MarketError::InvalidInput(format!(
            "{field} must be a non-negative integer, got '{value}'"
        )));
    }
    U256::from_str_radix(trimmed, 10)
        .map_err(|e| MarketError::InvalidInput(format!("{field} out of range: {e}")))
}
