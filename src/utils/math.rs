//! Checked arithmetic utilities.
//!
//! All conversion math in the engine routes through the wide mul-div helpers
//! so intermediate products use 128 bits and overflow is a hard error,
//! never wraparound.

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// WIDE MUL-DIV
// ═══════════════════════════════════════════════════════════════════════════════

/// Checked power of ten as u128
///
/// Exponents beyond 38 exceed u128 range and are rejected.
pub fn pow10(exp: u32) -> Result<u128> {
    10u128.checked_pow(exp).ok_or(Error::Overflow {
        operation: format!("10^{}", exp),
    })
}

/// Computes `floor(a * numerator / denominator)` with a 128-bit intermediate
///
/// The workhorse of the conversion engine: `a` is a token or reserve amount,
/// the numerator and denominator carry price and decimal-scale factors that
/// can individually exceed u64.
pub fn mul_div_wide(a: u64, numerator: u128, denominator: u128) -> Result<u64> {
    if denominator == 0 {
        return Err(Error::InvalidParameter {
            name: "denominator".into(),
            reason: "division by zero".into(),
        });
    }
    let product = (a as u128).checked_mul(numerator).ok_or(Error::Overflow {
        operation: format!("{} * {}", a, numerator),
    })?;
    let result = product / denominator;
    if result > u64::MAX as u128 {
        return Err(Error::Overflow {
            operation: format!("({} * {}) / {}", a, numerator, denominator),
        });
    }
    Ok(result as u64)
}

/// Computes `ceil(a * numerator / denominator)` with a 128-bit intermediate
pub fn mul_div_wide_ceil(a: u64, numerator: u128, denominator: u128) -> Result<u64> {
    if denominator == 0 {
        return Err(Error::InvalidParameter {
            name: "denominator".into(),
            reason: "division by zero".into(),
        });
    }
    let product = (a as u128).checked_mul(numerator).ok_or(Error::Overflow {
        operation: format!("{} * {}", a, numerator),
    })?;
    let result = product
        .checked_add(denominator - 1)
        .ok_or(Error::Overflow {
            operation: format!("ceil({} * {})", a, numerator),
        })?
        / denominator;
    if result > u64::MAX as u128 {
        return Err(Error::Overflow {
            operation: format!("ceil(({} * {}) / {})", a, numerator, denominator),
        });
    }
    Ok(result as u64)
}
