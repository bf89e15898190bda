//! Price resolution with fallback.
//!
//! This module turns raw feed answers into usable quotes:
//! - Normalizes feed decimals to the engine's 6-decimal price scale
//! - Serves the operator-configured fallback, bypassing the live feed
//!   entirely, for as long as the fallback is enabled
//! - Optionally rejects live answers older than a configured age
//!
//! A non-positive live answer is an [`Error::InvalidPrice`]; no default
//! price is ever substituted for it. Enabling or disabling the fallback
//! only changes how the next read resolves, never past quotes.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::oracle::feed::{FeedAnswer, PriceFeed};
use crate::utils::constants::PRICE_DECIMALS;
use crate::utils::math::pow10;

// ═══════════════════════════════════════════════════════════════════════════════
// QUOTE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a resolved quote came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteSource {
    /// Live feed answer
    Feed,
    /// Operator-configured fallback price
    Fallback,
}

impl std::fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteSource::Feed => write!(f, "feed"),
            QuoteSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A resolved price in engine decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price in 10^-6 units per whole token
    pub price: u64,
    /// Where the price came from
    pub source: QuoteSource,
    /// Timestamp of the underlying answer (serve time for fallback)
    pub updated_at: u64,
}

/// Operator-configured fallback price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FallbackPrice {
    /// Whether the fallback may serve quotes
    pub enabled: bool,
    /// Fallback price in 10^-6 units
    pub price: u64,
}

impl FallbackPrice {
    /// Fallback switched off
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Fallback switched on at the given price
    pub fn enabled_at(price: u64) -> Self {
        Self {
            enabled: true,
            price,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE ORACLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves the current price from a feed, with fallback handling.
///
/// The oracle itself is stateless: the fallback configuration is passed in
/// per read so it can live in persisted engine state.
pub struct PriceOracle {
    /// Upstream feed
    feed: Box<dyn PriceFeed>,
    /// Maximum acceptable answer age in seconds (None: no staleness check)
    max_age_secs: Option<u64>,
    /// Decimals quotes are normalized to
    target_decimals: u8,
}

impl PriceOracle {
    /// Create an oracle over the given feed
    pub fn new(feed: Box<dyn PriceFeed>) -> Self {
        Self {
            feed,
            max_age_secs: None,
            target_decimals: PRICE_DECIMALS,
        }
    }

    /// Set the maximum acceptable answer age
    pub fn with_max_age(mut self, max_age_secs: Option<u64>) -> Self {
        self.max_age_secs = max_age_secs;
        self
    }

    /// Set the decimals quotes are normalized to
    pub fn with_target_decimals(mut self, decimals: u8) -> Self {
        self.target_decimals = decimals;
        self
    }

    /// Swap the upstream feed
    pub fn set_feed(&mut self, feed: Box<dyn PriceFeed>) {
        self.feed = feed;
    }

    /// Description of the upstream feed
    pub fn description(&self) -> String {
        self.feed.description()
    }

    /// Resolve the current price.
    ///
    /// While the fallback is enabled the configured price is served
    /// unconditionally and the live feed is not consulted at all. With
    /// the fallback disabled the live answer must be strictly positive
    /// (and within the maximum age, when one is set) or the read fails;
    /// a feed transport failure propagates as the feed reported it.
    pub fn quote(&self, fallback: &FallbackPrice, now: u64) -> Result<PriceQuote> {
        if fallback.enabled {
            return self.fallback_quote(fallback, now);
        }

        let answer = self.feed.latest_answer()?;
        if !answer.is_positive() {
            return Err(Error::InvalidPrice {
                value: answer.value,
            });
        }

        if let Some(max_age) = self.max_age_secs {
            let age = answer.age(now);
            if age > max_age {
                return Err(Error::StalePrice {
                    last_update: age,
                    max_age,
                });
            }
        }

        let price = normalize_price(answer.value as u64, answer.decimals, self.target_decimals)?;
        if price == 0 {
            // Positive answer floored away by downscaling
            return Err(Error::InvalidPrice {
                value: answer.value,
            });
        }

        Ok(PriceQuote {
            price,
            source: QuoteSource::Feed,
            updated_at: answer.updated_at,
        })
    }

    /// Serve the operator-configured manual price
    fn fallback_quote(&self, fallback: &FallbackPrice, now: u64) -> Result<PriceQuote> {
        if fallback.price == 0 {
            // Enabled but never set; as unusable as a dead feed
            return Err(Error::InvalidPrice { value: 0 });
        }

        tracing::warn!("Fallback enabled, serving manual price {}", fallback.price);

        Ok(PriceQuote {
            price: fallback.price,
            source: QuoteSource::Fallback,
            updated_at: now,
        })
    }
}

/// Rescale a positive raw value between decimal bases.
///
/// Downscaling floors; upscaling fails on overflow rather than wrapping.
fn normalize_price(value: u64, from_decimals: u8, to_decimals: u8) -> Result<u64> {
    if from_decimals == to_decimals {
        return Ok(value);
    }

    if from_decimals > to_decimals {
        let divisor = pow10((from_decimals - to_decimals) as u32)?;
        let scaled = value as u128 / divisor;
        return Ok(scaled as u64);
    }

    let factor = pow10((to_decimals - from_decimals) as u32)?;
    let scaled = (value as u128).checked_mul(factor).ok_or(Error::Overflow {
        operation: "normalize price".into(),
    })?;

    if scaled > u64::MAX as u128 {
        return Err(Error::Overflow {
            operation: "normalize price".into(),
        });
    }

    Ok(scaled as u64)
}
