//! Engine events for state change notifications.
//!
//! Events are emitted for all significant state changes in the engine,
//! enabling clients to track activity and react accordingly. Deposits
//! and redemptions record the price and quote source they settled at.

use serde::{Deserialize, Serialize};

use crate::core::collateral::ReserveAmount;
use crate::core::token::TokenAmount;
use crate::oracle::source::QuoteSource;
use crate::utils::constants::DEFAULT_MAX_EVENTS;
use crate::utils::crypto::{AccountId, Hash};

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// All engine event types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    // Lifecycle Events
    /// Engine state was initialized
    Initialized(InitializedEvent),

    // Exchange Events
    /// Reserve was deposited and tokens minted
    Deposited(DepositedEvent),
    /// Tokens were burned and reserve returned
    Redeemed(RedeemedEvent),

    // Token Events
    /// Tokens were transferred between accounts
    Transferred(TransferredEvent),

    // Admin Events
    /// Tokens were minted without backing by the owner
    AdminMinted(AdminMintedEvent),
    /// Reserve was withdrawn by the owner
    ReserveWithdrawn(ReserveWithdrawnEvent),
    /// Fallback price was enabled
    FallbackEnabled(FallbackEnabledEvent),
    /// Fallback price was disabled
    FallbackDisabled(FallbackDisabledEvent),
    /// Fallback price value was changed
    FallbackPriceSet(FallbackPriceSetEvent),
    /// Price feed was replaced
    FeedUpdated(FeedUpdatedEvent),
    /// Engine ownership moved to a new account
    OwnershipTransferred(OwnershipTransferredEvent),
}

impl EngineEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Initialized(_) => "Initialized",
            Self::Deposited(_) => "Deposited",
            Self::Redeemed(_) => "Redeemed",
            Self::Transferred(_) => "Transferred",
            Self::AdminMinted(_) => "AdminMinted",
            Self::ReserveWithdrawn(_) => "ReserveWithdrawn",
            Self::FallbackEnabled(_) => "FallbackEnabled",
            Self::FallbackDisabled(_) => "FallbackDisabled",
            Self::FallbackPriceSet(_) => "FallbackPriceSet",
            Self::FeedUpdated(_) => "FeedUpdated",
            Self::OwnershipTransferred(_) => "OwnershipTransferred",
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Initialized(e) => e.timestamp,
            Self::Deposited(e) => e.timestamp,
            Self::Redeemed(e) => e.timestamp,
            Self::Transferred(e) => e.timestamp,
            Self::AdminMinted(e) => e.timestamp,
            Self::ReserveWithdrawn(e) => e.timestamp,
            Self::FallbackEnabled(e) => e.timestamp,
            Self::FallbackDisabled(e) => e.timestamp,
            Self::FallbackPriceSet(e) => e.timestamp,
            Self::FeedUpdated(e) => e.timestamp,
            Self::OwnershipTransferred(e) => e.timestamp,
        }
    }

    /// Compute event hash
    pub fn hash(&self) -> Hash {
        let data = bincode::serialize(self).unwrap_or_default();
        Hash::sha256(&data)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIFECYCLE EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when the engine state is initialized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializedEvent {
    /// Initial owner
    pub owner: AccountId,
    /// State schema version
    pub version: u32,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXCHANGE EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when reserve is deposited for tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositedEvent {
    /// Depositor
    pub account: AccountId,
    /// Reserve paid in
    pub reserve_amount: ReserveAmount,
    /// Tokens minted in exchange
    pub tokens_minted: TokenAmount,
    /// Price the exchange settled at (10^-6 units)
    pub price: u64,
    /// Where the price came from
    pub source: QuoteSource,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when tokens are redeemed for reserve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemedEvent {
    /// Redeemer
    pub account: AccountId,
    /// Tokens burned
    pub tokens_burned: TokenAmount,
    /// Reserve paid out
    pub reserve_returned: ReserveAmount,
    /// Price the exchange settled at (10^-6 units)
    pub price: u64,
    /// Where the price came from
    pub source: QuoteSource,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when tokens move between accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferredEvent {
    /// Sender
    pub from: AccountId,
    /// Recipient
    pub to: AccountId,
    /// Amount moved
    pub amount: TokenAmount,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADMIN EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when the owner mints unbacked tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminMintedEvent {
    /// Recipient
    pub to: AccountId,
    /// Amount minted
    pub amount: TokenAmount,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when the owner withdraws reserve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveWithdrawnEvent {
    /// Recipient of the withdrawal
    pub to: AccountId,
    /// Amount withdrawn
    pub amount: ReserveAmount,
    /// Reserve left in the vault afterwards
    pub remaining_reserve: ReserveAmount,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when the fallback price is enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackEnabledEvent {
    /// Fallback price (10^-6 units)
    pub price: u64,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when the fallback price is disabled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackDisabledEvent {
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when the fallback price value changes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackPriceSetEvent {
    /// Previous fallback price (10^-6 units)
    pub previous: u64,
    /// New fallback price (10^-6 units)
    pub price: u64,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when the price feed is replaced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedUpdatedEvent {
    /// Description of the new feed
    pub description: String,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when ownership is transferred
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipTransferredEvent {
    /// Previous owner
    pub previous_owner: AccountId,
    /// New owner
    pub new_owner: AccountId,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Bounded in-memory log of recent events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<EngineEvent>,
    max_events: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self::with_max_events(DEFAULT_MAX_EVENTS)
    }

    /// Create a log that keeps at most `max_events` recent events
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Add an event to the log, pruning the oldest past the cap
    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);

        if self.events.len() > self.max_events {
            let excess = self.events.len() - self.max_events;
            self.events.drain(0..excess);
        }
    }

    /// Get all retained events
    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn filter_by_type(&self, event_type: &str) -> Vec<&EngineEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get the number of retained events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit_event(timestamp: u64) -> EngineEvent {
        EngineEvent::Deposited(DepositedEvent {
            account: AccountId::from_seed(b"alice"),
            reserve_amount: ReserveAmount::from_micros(2_600_000_000),
            tokens_minted: TokenAmount::from_units(10),
            price: 260_000_000,
            source: QuoteSource::Feed,
            timestamp,
        })
    }

    #[test]
    fn test_event_metadata() {
        let event = deposit_event(1_234_567_890);

        assert_eq!(event.event_type(), "Deposited");
        assert_eq!(event.timestamp(), 1_234_567_890);
    }

    #[test]
    fn test_event_hash_is_deterministic() {
        let event = deposit_event(1_234_567_890);

        let hash1 = event.hash();
        let hash2 = event.hash();
        assert_eq!(hash1, hash2);
        assert!(!hash1.is_zero());
    }

    #[test]
    fn test_event_log_filtering() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.push(deposit_event(1));
        log.push(EngineEvent::Redeemed(RedeemedEvent {
            account: AccountId::from_seed(b"alice"),
            tokens_burned: TokenAmount::from_units(1),
            reserve_returned: ReserveAmount::from_micros(260_000_000),
            price: 260_000_000,
            source: QuoteSource::Feed,
            timestamp: 2,
        }));

        assert_eq!(log.len(), 2);
        assert_eq!(log.filter_by_type("Deposited").len(), 1);
        assert_eq!(log.filter_by_type("Redeemed").len(), 1);
        assert_eq!(log.filter_by_type("Transferred").len(), 0);
    }

    #[test]
    fn test_event_log_prunes_oldest() {
        let mut log = EventLog::with_max_events(3);

        for i in 0..5 {
            log.push(deposit_event(i));
        }

        assert_eq!(log.len(), 3);
        // Oldest two were pruned
        assert_eq!(log.events()[0].timestamp(), 2);
        assert_eq!(log.events()[2].timestamp(), 4);
    }

    #[test]
    fn test_event_log_clear() {
        let mut log = EventLog::new();
        log.push(deposit_event(1));
        log.push(deposit_event(2));

        log.clear();
        assert!(log.is_empty());
    }
}
