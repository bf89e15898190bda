//! Reserve asset handling.
//!
//! This module covers the stablecoin side of the system:
//! - Strongly-typed reserve amounts in micro-units (6 decimals)
//! - The [`ReserveToken`] trait the engine settles against
//! - An in-memory stablecoin with a faucet for testing and local runs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::utils::constants::{RESERVE_DECIMALS, RESERVE_UNIT};
use crate::utils::crypto::AccountId;

// ═══════════════════════════════════════════════════════════════════════════════
// RESERVE AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed reserve amount in micro-units (10^-6 of one stablecoin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReserveAmount(u64);

impl ReserveAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from micro-units
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create from whole stablecoins (for convenience)
    pub fn from_whole(whole: u64) -> Self {
        Self(whole * RESERVE_UNIT)
    }

    /// Get raw micro-unit value
    pub fn micros(&self) -> u64 {
        self.0
    }

    /// Get value in whole stablecoins (truncated)
    pub fn whole(&self) -> u64 {
        self.0 / RESERVE_UNIT
    }

    /// Get formatted string representation
    pub fn to_string_formatted(&self) -> String {
        format!("{}.{:06}", self.0 / RESERVE_UNIT, self.0 % RESERVE_UNIT)
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating addition
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Saturating subtraction
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl std::fmt::Display for ReserveAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_formatted())
    }
}

impl From<u64> for ReserveAmount {
    fn from(micros: u64) -> Self {
        Self(micros)
    }
}

impl From<ReserveAmount> for u64 {
    fn from(amount: ReserveAmount) -> Self {
        amount.0
    }
}

impl std::str::FromStr for ReserveAmount {
    type Err = Error;

    /// Parse a decimal string like "2600" or "2599.999999" into micro-units.
    ///
    /// More than 6 decimal places is rejected rather than silently rounded.
    fn from_str(s: &str) -> Result<Self> {
        let value: Decimal = s.trim().parse().map_err(|_| Error::InvalidParameter {
            name: "amount".into(),
            reason: format!("'{}' is not a decimal number", s.trim()),
        })?;

        if value.is_sign_negative() {
            return Err(Error::InvalidParameter {
                name: "amount".into(),
                reason: "must not be negative".into(),
            });
        }

        let scaled = value
            .checked_mul(Decimal::from(RESERVE_UNIT))
            .ok_or(Error::Overflow {
                operation: "parse reserve amount".into(),
            })?;

        if scaled.fract() != Decimal::ZERO {
            return Err(Error::InvalidParameter {
                name: "amount".into(),
                reason: format!("at most {} decimal places supported", RESERVE_DECIMALS),
            });
        }

        let micros = scaled.to_u64().ok_or(Error::Overflow {
            operation: "parse reserve amount".into(),
        })?;

        Ok(Self(micros))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESERVE TOKEN TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface to the reserve stablecoin the engine settles against.
///
/// `transfer_in` pulls funds a holder has approved for the spender and
/// consumes the allowance; `transfer_out` pushes the sender's own funds.
/// Both fail with [`Error::TransferFailed`] and leave every balance
/// untouched when the transfer cannot be settled in full.
pub trait ReserveToken {
    /// Decimal places of the reserve asset
    fn decimals(&self) -> u8;

    /// Ticker symbol of the reserve asset
    fn symbol(&self) -> &str;

    /// Get balance of an account
    fn balance_of(&self, owner: &AccountId) -> ReserveAmount;

    /// Get remaining allowance granted by `owner` to `spender`
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> ReserveAmount;

    /// Pull `amount` from `from` into `to`, consuming the allowance
    /// `from` granted to `to`
    fn transfer_in(&mut self, from: AccountId, to: AccountId, amount: ReserveAmount)
        -> Result<()>;

    /// Push `amount` of `from`'s own balance to `to`
    fn transfer_out(&mut self, from: AccountId, to: AccountId, amount: ReserveAmount)
        -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// STABLE TOKEN
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory reserve stablecoin with an open faucet.
///
/// Stands in for the external USD-pegged token in tests and local runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableToken {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
    /// Total supply in micro-units
    total_supply: ReserveAmount,
    /// Balances by account
    balances: BTreeMap<AccountId, ReserveAmount>,
    /// Allowances by owner, then spender
    allowances: BTreeMap<AccountId, BTreeMap<AccountId, ReserveAmount>>,
}

impl StableToken {
    /// Create a new stablecoin with an empty ledger
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: RESERVE_DECIMALS,
            total_supply: ReserveAmount::ZERO,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// Get total supply
    pub fn total_supply(&self) -> ReserveAmount {
        self.total_supply
    }

    /// Mint from the faucet (open to anyone, test money only)
    pub fn faucet(&mut self, to: AccountId, amount: ReserveAmount) -> Result<()> {
        if amount.is_zero() {
            return Err(Error::AmountTooSmall {
                amount: 0,
                minimum: 1,
            });
        }

        let new_supply = self.total_supply.checked_add(amount).ok_or(Error::Overflow {
            operation: "faucet total supply".into(),
        })?;

        let current = self.balance_of(&to);
        let new_balance = current.checked_add(amount).ok_or(Error::Overflow {
            operation: "faucet balance".into(),
        })?;

        self.balances.insert(to, new_balance);
        self.total_supply = new_supply;

        Ok(())
    }

    /// Set the allowance `owner` grants to `spender` (absolute, not additive)
    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: ReserveAmount) {
        if amount.is_zero() {
            if let Some(spenders) = self.allowances.get_mut(&owner) {
                spenders.remove(&spender);
                if spenders.is_empty() {
                    self.allowances.remove(&owner);
                }
            }
        } else {
            self.allowances.entry(owner).or_default().insert(spender, amount);
        }
    }

    fn set_balance(&mut self, account: AccountId, balance: ReserveAmount) {
        if balance.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }

    fn move_balance(&mut self, from: AccountId, to: AccountId, amount: ReserveAmount) -> Result<()> {
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(Error::TransferFailed {
                reason: format!(
                    "insufficient {} balance: need {}, have {}",
                    self.symbol, amount, from_balance
                ),
            });
        }

        if from == to {
            return Ok(()); // No-op for self-transfer
        }

        let to_balance = self.balance_of(&to);
        let new_to_balance = to_balance.checked_add(amount).ok_or(Error::Overflow {
            operation: "reserve transfer balance".into(),
        })?;

        self.set_balance(from, from_balance.saturating_sub(amount));
        self.set_balance(to, new_to_balance);

        Ok(())
    }
}

impl ReserveToken for StableToken {
    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn balance_of(&self, owner: &AccountId) -> ReserveAmount {
        self.balances.get(owner).copied().unwrap_or(ReserveAmount::ZERO)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> ReserveAmount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(ReserveAmount::ZERO)
    }

    fn transfer_in(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: ReserveAmount,
    ) -> Result<()> {
        let allowed = self.allowance(&from, &to);
        if allowed < amount {
            return Err(Error::TransferFailed {
                reason: format!(
                    "insufficient {} allowance: need {}, approved {}",
                    self.symbol, amount, allowed
                ),
            });
        }

        // Allowance is consumed only after the balance move succeeds
        self.move_balance(from, to, amount)?;

        let remaining = allowed.saturating_sub(amount);
        self.approve(from, to, remaining);

        Ok(())
    }

    fn transfer_out(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: ReserveAmount,
    ) -> Result<()> {
        self.move_balance(from, to, amount)
    }
}
