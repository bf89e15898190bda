//! Input validation utilities.
//!
//! This module provides validation functions to ensure inputs meet
//! engine requirements before processing.

use crate::error::{Error, Result};
use crate::utils::constants::MAX_DECIMALS;

// ═══════════════════════════════════════════════════════════════════════════════
// AMOUNT VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate that an amount is non-zero
///
/// Zero amounts are rejected before any oracle read so a broken feed
/// never masks the real problem with the request.
pub fn validate_non_zero(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(Error::AmountTooSmall {
            amount: 0,
            minimum: 1,
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate a fallback price before it is stored
///
/// Zero is rejected at set time; an enabled fallback always carries a
/// usable price.
pub fn validate_fallback_price(price: u64) -> Result<()> {
    if price == 0 {
        return Err(Error::InvalidParameter {
            name: "fallback_price".into(),
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Validate a decimal count fits the engine's arithmetic bounds
pub fn validate_decimals(value: u8, name: &str) -> Result<()> {
    if value > MAX_DECIMALS {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: format!("{} exceeds maximum {} decimals", value, MAX_DECIMALS),
        });
    }
    Ok(())
}

/// Validate a token name or symbol is non-empty
pub fn validate_identity(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidParameter {
            name: name.into(),
            reason: "cannot be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_zero() {
        assert!(validate_non_zero(1).is_ok());
        assert!(validate_non_zero(u64::MAX).is_ok());

        let err = validate_non_zero(0).unwrap_err();
        assert!(matches!(err, Error::AmountTooSmall { amount: 0, minimum: 1 }));
    }

    #[test]
    fn test_validate_fallback_price() {
        assert!(validate_fallback_price(260_000_000).is_ok());
        assert!(validate_fallback_price(0).is_err());
    }

    #[test]
    fn test_validate_decimals() {
        assert!(validate_decimals(0, "token_decimals").is_ok());
        assert!(validate_decimals(MAX_DECIMALS, "reserve_decimals").is_ok());
        assert!(validate_decimals(MAX_DECIMALS + 1, "price_decimals").is_err());
    }

    #[test]
    fn test_validate_identity() {
        assert!(validate_identity("Synth USD", "name").is_ok());
        assert!(validate_identity("", "name").is_err());
        assert!(validate_identity("   ", "symbol").is_err());
    }
}
