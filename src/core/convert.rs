//! The conversion engine.
//!
//! Pure functions mapping reference-asset amounts to synthetic-token amounts
//! and back, parameterized by the current price and the decimal precisions in
//! [`EngineParams`]. Both directions round by **floor**: deposits never mint
//! more tokens than the collateral covers, and redemptions never pay out more
//! reserve than the tokens are worth. That one-sided bias is what keeps the
//! reserve solvent under arbitrarily long deposit/redeem sequences.
//!
//! With the price expressed as "reference units per one whole token" at
//! `price_decimals` precision:
//!
//! ```text
//! tokens  = floor( reserve * 10^(price_decimals + token_decimals)
//!                  / (price * 10^reserve_decimals) )
//! reserve = floor( tokens * price * 10^reserve_decimals
//!                  / 10^(price_decimals + token_decimals) )
//! ```
//!
//! All intermediates are 128-bit; overflow is an error, never wraparound.

use crate::core::config::EngineParams;
use crate::error::{Error, Result};
use crate::utils::math::{mul_div_wide, mul_div_wide_ceil, pow10};

/// Decimal-scale factors for one conversion at a given price
///
/// Returns `(token_scale, price_term)` where `token_scale` is
/// `10^(price_decimals + token_decimals)` and `price_term` is
/// `price * 10^reserve_decimals`.
fn conversion_factors(params: &EngineParams, price: u64) -> Result<(u128, u128)> {
    if price == 0 {
        return Err(Error::InvalidParameter {
            name: "price".into(),
            reason: "must be positive".into(),
        });
    }
    let token_scale = pow10(params.price_decimals as u32 + params.token_decimals as u32)?;
    let reserve_scale = pow10(params.reserve_decimals as u32)?;
    let price_term = (price as u128)
        .checked_mul(reserve_scale)
        .ok_or(Error::Overflow {
            operation: format!("{} * 10^{}", price, params.reserve_decimals),
        })?;
    Ok((token_scale, price_term))
}

/// Tokens minted for a reference-asset deposit
///
/// Floor rounding; a non-zero deposit that rounds to zero tokens fails
/// with [`Error::AmountTooSmall`] carrying the current minimum deposit.
pub fn tokens_for_reserve(params: &EngineParams, reserve_amount: u64, price: u64) -> Result<u64> {
    let (token_scale, price_term) = conversion_factors(params, price)?;
    let tokens = mul_div_wide(reserve_amount, token_scale, price_term)?;
    if tokens == 0 && reserve_amount > 0 {
        return Err(Error::AmountTooSmall {
            amount: reserve_amount,
            minimum: min_deposit(params, price)?,
        });
    }
    Ok(tokens)
}

/// Reference asset returned for redeeming tokens
///
/// Floor rounding, biased in favor of the reserve; a non-zero redemption
/// that rounds to zero proceeds fails with [`Error::AmountTooSmall`].
pub fn reserve_for_tokens(params: &EngineParams, token_amount: u64, price: u64) -> Result<u64> {
    let (token_scale, price_term) = conversion_factors(params, price)?;
    let reserve = mul_div_wide(token_amount, price_term, token_scale)?;
    if reserve == 0 && token_amount > 0 {
        let minimum = mul_div_wide_ceil(1, token_scale, price_term)?;
        return Err(Error::AmountTooSmall {
            amount: token_amount,
            minimum,
        });
    }
    Ok(reserve)
}

/// Smallest deposit that mints at least one token at the given price
pub fn min_deposit(params: &EngineParams, price: u64) -> Result<u64> {
    let (token_scale, price_term) = conversion_factors(params, price)?;
    mul_div_wide_ceil(1, price_term, token_scale)
}
