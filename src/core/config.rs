//! Engine configuration and parameters.
//!
//! This module defines the parameters fixed at initialization: the token
//! identity, the three decimal precisions the conversion engine bridges,
//! and the optional price-staleness window.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::*;
use crate::utils::validation::{validate_decimals, validate_identity};

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Engine parameters (set at initialization, persisted with the state)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Synthetic token name
    pub token_name: String,

    /// Synthetic token symbol
    pub token_symbol: String,

    /// Synthetic token decimals (0: whole units only)
    pub token_decimals: u8,

    /// Reference-asset decimals
    pub reserve_decimals: u8,

    /// Price decimals the engine normalizes feed answers to
    pub price_decimals: u8,

    /// Maximum feed-answer age in seconds; `None` disables the check
    pub max_price_age_secs: Option<u64>,

    /// Maximum events retained in the in-memory log
    pub max_events: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            token_name: DEFAULT_TOKEN_NAME.to_string(),
            token_symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            token_decimals: TOKEN_DECIMALS,
            reserve_decimals: RESERVE_DECIMALS,
            price_decimals: PRICE_DECIMALS,
            max_price_age_secs: None,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl EngineParams {
    /// Create parameters with a custom token identity
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            token_name: name.into(),
            token_symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Set the staleness window (for testing and operator configs)
    pub fn with_max_price_age(mut self, secs: u64) -> Self {
        self.max_price_age_secs = Some(secs);
        self
    }

    /// Set the in-memory event cap
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Validate parameters are consistent
    pub fn validate(&self) -> Result<()> {
        validate_identity(&self.token_name, "token_name")?;
        validate_identity(&self.token_symbol, "token_symbol")?;
        validate_decimals(self.token_decimals, "token_decimals")?;
        validate_decimals(self.reserve_decimals, "reserve_decimals")?;
        validate_decimals(self.price_decimals, "price_decimals")?;
        // Conversion exponents combine price and token decimals
        let combined = self.price_decimals as u32 + self.token_decimals as u32;
        if combined > MAX_DECIMALS as u32 {
            return Err(Error::InvalidParameter {
                name: "price_decimals + token_decimals".into(),
                reason: format!("{} exceeds maximum {} decimals", combined, MAX_DECIMALS),
            });
        }
        Ok(())
    }
}
