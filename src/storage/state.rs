//! Engine state management with persistence.
//!
//! This module owns the single persisted state blob: ledgers, parameters,
//! ownership and the fallback price all live in one [`EngineState`] that is
//! written atomically per operation. The blob carries a schema version;
//! state written by an older release is migrated on load, state written by
//! a newer release is refused.
//!
//! Schema evolution is additive only: a new field must carry
//! `#[serde(default)]` so blobs from earlier versions still decode.

use serde::{Deserialize, Serialize};

use crate::core::collateral::StableToken;
use crate::core::config::EngineParams;
use crate::core::token::SynthToken;
use crate::error::{Error, Result};
use crate::oracle::source::FallbackPrice;
use crate::protocol::events::EngineEvent;
use crate::storage::backend::{make_key, prefixes, StorageBackend, TypedStore};
use crate::utils::constants::{DEFAULT_RESERVE_NAME, DEFAULT_RESERVE_SYMBOL, STATE_VERSION};
use crate::utils::crypto::{AccountId, Hash};

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Complete persisted engine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    /// State schema version (for migrations)
    pub version: u32,
    /// Current owner, the only account allowed admin operations
    pub owner: AccountId,
    /// Vault account holding the reserve backing the supply
    pub vault: AccountId,
    /// Engine parameters
    pub params: EngineParams,
    /// Fallback price configuration
    pub fallback: FallbackPrice,
    /// Synthetic token ledger
    pub token: SynthToken,
    /// Reserve stablecoin ledger
    pub reserve: StableToken,
    /// Sequence number of the last committed operation
    pub last_sequence: u64,
    /// Unix timestamp of initialization
    pub created_at: u64,
    /// Unix timestamp of the last commit
    pub updated_at: u64,
}

impl EngineState {
    /// Create a fresh state for a new deployment
    pub fn new(params: EngineParams, owner: AccountId, vault: AccountId, now: u64) -> Self {
        let token = SynthToken::new(
            params.token_name.clone(),
            params.token_symbol.clone(),
            params.token_decimals,
        );

        Self {
            version: STATE_VERSION,
            owner,
            vault,
            params,
            fallback: FallbackPrice::disabled(),
            token,
            reserve: StableToken::new(DEFAULT_RESERVE_NAME, DEFAULT_RESERVE_SYMBOL),
            last_sequence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Verify state invariants
    pub fn verify_invariants(&self) -> Result<()> {
        if !self.token.verify_supply_invariant() {
            return Err(Error::InvariantViolation(format!(
                "token supply {} does not match balance sum",
                self.token.total_supply()
            )));
        }

        self.params.validate()?;

        Ok(())
    }

    /// Migrate state written by an older release to the current schema.
    ///
    /// Serde defaults have already filled any fields the old blob lacked;
    /// this stamps the version and gives migrations a place to rewrite
    /// data when a future schema needs it.
    pub fn migrate(mut self) -> Result<Self> {
        if self.version > STATE_VERSION {
            return Err(Error::UnsupportedStateVersion {
                found: self.version,
                supported: STATE_VERSION,
            });
        }

        if self.version < STATE_VERSION {
            tracing::info!(
                "Migrating engine state from version {} to {}",
                self.version,
                STATE_VERSION
            );
            self.version = STATE_VERSION;
        }

        Ok(self)
    }

    /// Compute state hash
    pub fn hash(&self) -> Hash {
        let data = bincode::serialize(self).unwrap_or_default();
        Hash::sha256(&data)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE MANAGER
// ═══════════════════════════════════════════════════════════════════════════════

/// High-level persistence for engine state and the event journal
pub struct StateManager<B: StorageBackend> {
    /// Underlying storage
    store: TypedStore<B>,
}

impl<B: StorageBackend> StateManager<B> {
    /// Create a new state manager
    pub fn new(backend: B) -> Self {
        Self {
            store: TypedStore::new(backend),
        }
    }

    fn state_key() -> Vec<u8> {
        make_key(prefixes::STATE, b"current")
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ENGINE STATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Check whether a state blob exists
    pub fn is_initialized(&self) -> Result<bool> {
        self.store.exists(&Self::state_key())
    }

    /// Write the initial state. Fails if one already exists.
    pub fn initialize(&self, state: &EngineState) -> Result<()> {
        if self.is_initialized()? {
            return Err(Error::AlreadyInitialized);
        }

        self.store.set(&Self::state_key(), state)?;
        self.store.flush()
    }

    /// Load the current state, migrating older schemas in place
    pub fn load(&self) -> Result<EngineState> {
        let state: EngineState = self
            .store
            .get(&Self::state_key())?
            .ok_or(Error::NotInitialized)?;

        let found_version = state.version;
        let state = state.migrate()?;

        if state.version != found_version {
            // Persist the stamped version so migration runs once
            self.save(&state)?;
        }

        Ok(state)
    }

    /// Save the current state
    pub fn save(&self, state: &EngineState) -> Result<()> {
        self.store.set(&Self::state_key(), state)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EVENT JOURNAL
    // ═══════════════════════════════════════════════════════════════════════════

    /// Append an event under its operation sequence number.
    ///
    /// Big-endian sequence keys keep the journal in commit order when
    /// listed by prefix.
    pub fn append_event(&self, sequence: u64, event: &EngineEvent) -> Result<()> {
        let key = make_key(prefixes::EVENT, &sequence.to_be_bytes());
        self.store.set(&key, event)
    }

    /// Drop a journaled event. Returns whether it was present.
    ///
    /// Used to unwind an event staged by a commit that failed to persist.
    pub fn remove_event(&self, sequence: u64) -> Result<bool> {
        let key = make_key(prefixes::EVENT, &sequence.to_be_bytes());
        self.store.delete(&key)
    }

    /// Load the most recent `limit` events, oldest first
    pub fn load_events(&self, limit: usize) -> Result<Vec<(u64, EngineEvent)>> {
        let keys = self.store.list_prefix(prefixes::EVENT)?;
        let start = keys.len().saturating_sub(limit);

        let mut events = Vec::new();
        for key in &keys[start..] {
            let suffix = &key[prefixes::EVENT.len()..];
            let sequence = match <[u8; 8]>::try_from(suffix) {
                Ok(bytes) => u64::from_be_bytes(bytes),
                Err(_) => continue, // Foreign key under the event prefix
            };

            if let Some(event) = self.store.get::<EngineEvent>(key)? {
                events.push((sequence, event));
            }
        }

        Ok(events)
    }

    /// Count journaled events
    pub fn event_count(&self) -> Result<usize> {
        Ok(self.store.list_prefix(prefixes::EVENT)?.len())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UTILITY METHODS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Flush all pending writes
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Clear all data (for testing)
    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATE SNAPSHOT
// ═══════════════════════════════════════════════════════════════════════════════

/// Point-in-time copy of engine state with its hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Captured state
    pub state: EngineState,
    /// Hash of the captured state
    pub state_hash: Hash,
    /// When the snapshot was taken
    pub taken_at: u64,
}

impl StateSnapshot {
    /// Capture a snapshot of the given state
    pub fn create(state: &EngineState, now: u64) -> Self {
        Self {
            state: state.clone(),
            state_hash: state.hash(),
            taken_at: now,
        }
    }

    /// Check the captured state still matches its hash
    pub fn verify(&self) -> bool {
        self.state.hash() == self.state_hash
    }

    /// Give back the captured state
    pub fn restore(self) -> EngineState {
        self.state
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
