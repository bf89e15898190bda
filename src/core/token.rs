//! Synthetic token implementation.
//!
//! This module implements the synthetic token ledger:
//! - Token minting and burning
//! - Balance tracking
//! - Transfer operations
//! - Supply management
//!
//! Balances live in an ordered map so serialization and the state hash
//! are deterministic without a sort step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::utils::crypto::{AccountId, Hash};
use crate::utils::validation::validate_non_zero;

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN AMOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed synthetic token amount (whole units, 0 decimals)
///
/// Prevents mixing token units with reserve micro-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(u64);

impl TokenAmount {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from whole units
    pub const fn from_units(units: u64) -> Self {
        Self(units)
    }

    /// Get raw unit count
    pub fn units(&self) -> u64 {
        self.0
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

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TokenAmount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl From<TokenAmount> for u64 {
    fn from(amount: TokenAmount) -> Self {
        amount.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTHETIC TOKEN
// ═══════════════════════════════════════════════════════════════════════════════

/// The synthetic token ledger
///
/// Pure balance bookkeeping: supply moves only through [`mint`](Self::mint)
/// and [`burn`](Self::burn); the engine above decides when those are allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthToken {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Decimal places (0: whole units only)
    pub decimals: u8,
    /// Total supply in whole units
    total_supply: TokenAmount,
    /// Balances by account
    balances: BTreeMap<AccountId, TokenAmount>,
}

impl SynthToken {
    /// Create a new token ledger
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: TokenAmount::ZERO,
            balances: BTreeMap::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SUPPLY MANAGEMENT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get total supply
    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Get balance of an account
    pub fn balance_of(&self, owner: &AccountId) -> TokenAmount {
        self.balances.get(owner).copied().unwrap_or(TokenAmount::ZERO)
    }

    /// Mint new tokens (called from deposit and admin mint)
    pub fn mint(&mut self, to: AccountId, amount: TokenAmount) -> Result<()> {
        validate_non_zero(amount.units())?;

        let new_supply = self.total_supply.checked_add(amount).ok_or(Error::Overflow {
            operation: "mint total supply".into(),
        })?;

        let current_balance = self.balance_of(&to);
        let new_balance = current_balance.checked_add(amount).ok_or(Error::Overflow {
            operation: "mint balance".into(),
        })?;

        self.balances.insert(to, new_balance);
        self.total_supply = new_supply;

        Ok(())
    }

    /// Burn tokens (called from redeem)
    pub fn burn(&mut self, from: AccountId, amount: TokenAmount) -> Result<()> {
        validate_non_zero(amount.units())?;

        let current_balance = self.balance_of(&from);
        if current_balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount.units(),
                available: current_balance.units(),
            });
        }

        let new_balance = current_balance.saturating_sub(amount);
        if new_balance.is_zero() {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, new_balance);
        }

        self.total_supply = self.total_supply.saturating_sub(amount);

        Ok(())
    }

    /// Transfer tokens between accounts
    pub fn transfer(&mut self, from: AccountId, to: AccountId, amount: TokenAmount) -> Result<()> {
        validate_non_zero(amount.units())?;

        if from == to {
            return Ok(()); // No-op for self-transfer
        }

        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(Error::InsufficientBalance {
                required: amount.units(),
                available: from_balance.units(),
            });
        }

        let new_from_balance = from_balance.saturating_sub(amount);
        if new_from_balance.is_zero() {
            self.balances.remove(&from);
        } else {
            self.balances.insert(from, new_from_balance);
        }

        let to_balance = self.balance_of(&to);
        let new_to_balance = to_balance.checked_add(amount).ok_or(Error::Overflow {
            operation: "transfer balance".into(),
        })?;
        self.balances.insert(to, new_to_balance);

        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Get number of token holders
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Get all balances (for auditing)
    pub fn all_balances(&self) -> &BTreeMap<AccountId, TokenAmount> {
        &self.balances
    }

    /// Verify supply invariant (total_supply == sum of all balances)
    pub fn verify_supply_invariant(&self) -> bool {
        let sum: u64 = self.balances.values().map(|b| b.units()).sum();
        sum == self.total_supply.units()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Compute state hash over supply and balances
    pub fn state_hash(&self) -> Hash {
        let mut data = Vec::new();
        data.extend_from_slice(&self.total_supply.units().to_be_bytes());

        // BTreeMap iteration is already sorted by account id
        for (account, balance) in &self.balances {
            data.extend_from_slice(account.as_bytes());
            data.extend_from_slice(&balance.units().to_be_bytes());
        }

        Hash::sha256(&data)
    }
}
