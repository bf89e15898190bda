//! Engine orchestration.
//!
//! The engine is the central coordinator for all operations. It ensures
//! atomic execution, state consistency, and invariant preservation: every
//! mutating operation works on a staged copy of state, verifies invariants,
//! persists, and only then becomes visible. A failed operation leaves both
//! the in-memory and the persisted state exactly as they were.
//!
//! State-changing operations read the price once and settle the whole
//! operation at that quote.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::collateral::{ReserveAmount, ReserveToken};
use crate::core::config::EngineParams;
use crate::core::convert;
use crate::core::token::TokenAmount;
use crate::error::{Error, Result};
use crate::oracle::feed::PriceFeed;
use crate::oracle::source::{FallbackPrice, PriceOracle, PriceQuote, QuoteSource};
use crate::protocol::events::*;
use crate::storage::backend::StorageBackend;
use crate::storage::state::{EngineState, StateManager, StateSnapshot};
use crate::utils::constants::STATE_VERSION;
use crate::utils::crypto::{AccountId, Hash};
use crate::utils::validation::{validate_fallback_price, validate_non_zero};

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIPTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a successful deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositReceipt {
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
    /// Sequence number of the committed operation
    pub sequence: u64,
}

/// Result of a successful redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemReceipt {
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
    /// Sequence number of the committed operation
    pub sequence: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// The synthetic token engine
pub struct SynthEngine<B: StorageBackend> {
    /// State persistence
    state_manager: StateManager<B>,
    /// Current committed state
    state: EngineState,
    /// Price resolution
    oracle: PriceOracle,
    /// Recent events from this session
    events: EventLog,
}

impl<B: StorageBackend> fmt::Debug for SynthEngine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthEngine")
            .field("state", &self.state)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<B: StorageBackend> SynthEngine<B> {
    // ═══════════════════════════════════════════════════════════════════════════
    // LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Initialize a fresh deployment.
    ///
    /// Writes the initial state blob and fails with
    /// [`Error::AlreadyInitialized`] if the backend already holds one.
    pub fn initialize(
        backend: B,
        params: EngineParams,
        feed: Box<dyn PriceFeed>,
        owner: AccountId,
        now: u64,
    ) -> Result<Self> {
        params.validate()?;

        if owner.is_zero() {
            return Err(Error::InvalidParameter {
                name: "owner".into(),
                reason: "owner must not be the zero account".into(),
            });
        }

        // The vault is a well-known account derived from the token symbol
        let vault_seed = format!("vault:{}", params.token_symbol);
        let vault = AccountId::from_seed(vault_seed.as_bytes());

        let state = EngineState::new(params, owner, vault, now);

        let state_manager = StateManager::new(backend);
        state_manager.initialize(&state)?;

        let event = EngineEvent::Initialized(InitializedEvent {
            owner,
            version: STATE_VERSION,
            timestamp: now,
        });
        state_manager.append_event(0, &event)?;
        state_manager.flush()?;

        let oracle = PriceOracle::new(feed)
            .with_max_age(state.params.max_price_age_secs)
            .with_target_decimals(state.params.price_decimals);

        let mut events = EventLog::with_max_events(state.params.max_events);
        events.push(event);

        tracing::info!("Initialized engine, owner {}", state.owner);

        Ok(Self {
            state_manager,
            state,
            oracle,
            events,
        })
    }

    /// Open an existing deployment from its backend
    pub fn open(backend: B, feed: Box<dyn PriceFeed>) -> Result<Self> {
        let state_manager = StateManager::new(backend);
        let state = state_manager.load()?;

        let oracle = PriceOracle::new(feed)
            .with_max_age(state.params.max_price_age_secs)
            .with_target_decimals(state.params.price_decimals);

        let events = EventLog::with_max_events(state.params.max_events);

        Ok(Self {
            state_manager,
            state,
            oracle,
            events,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // COMMIT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Commit a staged state with its event. Returns the sequence number.
    ///
    /// A failed backend write unwinds before the error propagates: no
    /// trace of the rejected operation may survive in the backend, where
    /// a later flush would persist it.
    fn commit(&mut self, mut staged: EngineState, event: EngineEvent, now: u64) -> Result<u64> {
        staged.verify_invariants()?;

        staged.last_sequence += 1;
        staged.updated_at = now;
        let sequence = staged.last_sequence;

        if let Err(err) = self.write_staged(&staged, Some((sequence, &event))) {
            self.roll_back(Some(sequence));
            return Err(err);
        }

        self.state = staged;
        self.events.push(event);

        Ok(sequence)
    }

    /// Persist a staged state without journaling an engine operation.
    ///
    /// Used for reserve-side bookkeeping (faucet, approvals) that is not
    /// part of the engine's own operation history.
    fn persist(&mut self, mut staged: EngineState, now: u64) -> Result<()> {
        staged.verify_invariants()?;
        staged.updated_at = now;

        if let Err(err) = self.write_staged(&staged, None) {
            self.roll_back(None);
            return Err(err);
        }

        self.state = staged;

        Ok(())
    }

    /// Write a staged state, and its event if any, through to the backend
    fn write_staged(
        &self,
        staged: &EngineState,
        event: Option<(u64, &EngineEvent)>,
    ) -> Result<()> {
        self.state_manager.save(staged)?;
        if let Some((sequence, event)) = event {
            self.state_manager.append_event(sequence, event)?;
        }
        self.state_manager.flush()
    }

    /// Put the committed state back into the backend after a failed write.
    ///
    /// The backend cache may already hold the staged state or its event.
    /// Rollback errors are logged, not propagated; the caller reports the
    /// original write failure.
    fn roll_back(&self, staged_sequence: Option<u64>) {
        if let Err(err) = self.state_manager.save(&self.state) {
            tracing::error!("Rollback could not restore state: {}", err);
        }
        if let Some(sequence) = staged_sequence {
            if let Err(err) = self.state_manager.remove_event(sequence) {
                tracing::error!("Rollback could not drop event {}: {}", sequence, err);
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXCHANGE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposit reserve and mint tokens at the current price.
    ///
    /// The deposit is floored to whole tokens; an amount worth less than
    /// one token is rejected with [`Error::AmountTooSmall`] before any
    /// funds move.
    pub fn deposit(
        &mut self,
        account: AccountId,
        amount: ReserveAmount,
        now: u64,
    ) -> Result<DepositReceipt> {
        validate_non_zero(amount.micros())?;

        let quote = self.quote(now)?;
        let minted = convert::tokens_for_reserve(&self.state.params, amount.micros(), quote.price)?;
        let tokens_minted = TokenAmount::from_units(minted);

        let mut staged = self.state.clone();
        let vault = staged.vault;
        staged.reserve.transfer_in(account, vault, amount)?;
        staged.token.mint(account, tokens_minted)?;

        let event = EngineEvent::Deposited(DepositedEvent {
            account,
            reserve_amount: amount,
            tokens_minted,
            price: quote.price,
            source: quote.source,
            timestamp: now,
        });

        let sequence = self.commit(staged, event, now)?;

        tracing::info!(
            "Deposit: {} reserve for {} tokens at price {} ({})",
            amount,
            tokens_minted,
            quote.price,
            quote.source
        );

        Ok(DepositReceipt {
            account,
            reserve_amount: amount,
            tokens_minted,
            price: quote.price,
            source: quote.source,
            sequence,
        })
    }

    /// Burn tokens and return reserve at the current price
    pub fn redeem(
        &mut self,
        account: AccountId,
        tokens: TokenAmount,
        now: u64,
    ) -> Result<RedeemReceipt> {
        validate_non_zero(tokens.units())?;

        let quote = self.quote(now)?;
        let payout = convert::reserve_for_tokens(&self.state.params, tokens.units(), quote.price)?;
        let reserve_returned = ReserveAmount::from_micros(payout);

        let mut staged = self.state.clone();
        let vault = staged.vault;

        // The caller's balance is checked before the vault's funding
        staged.token.burn(account, tokens)?;

        let vault_balance = staged.reserve.balance_of(&vault);
        if vault_balance < reserve_returned {
            return Err(Error::InsufficientReserve {
                required: reserve_returned.micros(),
                available: vault_balance.micros(),
            });
        }

        staged.reserve.transfer_out(vault, account, reserve_returned)?;

        let event = EngineEvent::Redeemed(RedeemedEvent {
            account,
            tokens_burned: tokens,
            reserve_returned,
            price: quote.price,
            source: quote.source,
            timestamp: now,
        });

        let sequence = self.commit(staged, event, now)?;

        tracing::info!(
            "Redeem: {} tokens for {} reserve at price {} ({})",
            tokens,
            reserve_returned,
            quote.price,
            quote.source
        );

        Ok(RedeemReceipt {
            account,
            tokens_burned: tokens,
            reserve_returned,
            price: quote.price,
            source: quote.source,
            sequence,
        })
    }

    /// Buy tokens with reserve. Alias for [`deposit`](Self::deposit).
    pub fn buy_tokens(
        &mut self,
        account: AccountId,
        amount: ReserveAmount,
        now: u64,
    ) -> Result<DepositReceipt> {
        self.deposit(account, amount, now)
    }

    /// Sell tokens back for reserve. Alias for [`redeem`](Self::redeem).
    pub fn sell_tokens(
        &mut self,
        account: AccountId,
        tokens: TokenAmount,
        now: u64,
    ) -> Result<RedeemReceipt> {
        self.redeem(account, tokens, now)
    }

    /// Transfer tokens between accounts
    pub fn transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: TokenAmount,
        now: u64,
    ) -> Result<u64> {
        validate_non_zero(amount.units())?;

        let mut staged = self.state.clone();
        staged.token.transfer(from, to, amount)?;

        let event = EngineEvent::Transferred(TransferredEvent {
            from,
            to,
            amount,
            timestamp: now,
        });

        self.commit(staged, event, now)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RESERVE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Mint reserve from the faucet (test money, open to anyone)
    pub fn faucet(&mut self, to: AccountId, amount: ReserveAmount, now: u64) -> Result<()> {
        let mut staged = self.state.clone();
        staged.reserve.faucet(to, amount)?;
        self.persist(staged, now)
    }

    /// Approve the vault to pull reserve from `owner` on deposit
    pub fn approve(&mut self, owner: AccountId, amount: ReserveAmount, now: u64) -> Result<()> {
        let mut staged = self.state.clone();
        let vault = staged.vault;
        staged.reserve.approve(owner, vault, amount);
        self.persist(staged, now)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ADMIN OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn require_owner(&self, caller: &AccountId) -> Result<()> {
        if *caller != self.state.owner {
            return Err(Error::Unauthorized("caller is not the owner".into()));
        }
        Ok(())
    }

    /// Mint tokens without reserve backing. Owner only.
    pub fn admin_mint(
        &mut self,
        caller: AccountId,
        to: AccountId,
        amount: TokenAmount,
        now: u64,
    ) -> Result<u64> {
        self.require_owner(&caller)?;
        validate_non_zero(amount.units())?;

        let mut staged = self.state.clone();
        staged.token.mint(to, amount)?;

        let event = EngineEvent::AdminMinted(AdminMintedEvent {
            to,
            amount,
            timestamp: now,
        });

        let sequence = self.commit(staged, event, now)?;

        tracing::warn!("Admin mint: {} unbacked tokens to {}", amount, to);

        Ok(sequence)
    }

    /// Withdraw reserve from the vault to the owner. Owner only.
    pub fn withdraw_reserve(
        &mut self,
        caller: AccountId,
        amount: ReserveAmount,
        now: u64,
    ) -> Result<u64> {
        self.require_owner(&caller)?;
        validate_non_zero(amount.micros())?;

        let vault_balance = self.state.reserve.balance_of(&self.state.vault);
        if vault_balance < amount {
            return Err(Error::InsufficientReserve {
                required: amount.micros(),
                available: vault_balance.micros(),
            });
        }

        let mut staged = self.state.clone();
        let vault = staged.vault;
        let owner = staged.owner;
        staged.reserve.transfer_out(vault, owner, amount)?;
        let remaining_reserve = staged.reserve.balance_of(&vault);

        let event = EngineEvent::ReserveWithdrawn(ReserveWithdrawnEvent {
            to: owner,
            amount,
            remaining_reserve,
            timestamp: now,
        });

        let sequence = self.commit(staged, event, now)?;

        tracing::warn!(
            "Reserve withdrawal: {} to owner {}, {} remaining",
            amount,
            owner,
            remaining_reserve
        );

        Ok(sequence)
    }

    /// Enable the fallback price at the given value. Owner only.
    ///
    /// Every conversion prices against this value, without consulting
    /// the live feed, until the fallback is disabled.
    pub fn enable_fallback(&mut self, caller: AccountId, price: u64, now: u64) -> Result<u64> {
        self.require_owner(&caller)?;
        validate_fallback_price(price)?;

        let mut staged = self.state.clone();
        staged.fallback = FallbackPrice::enabled_at(price);

        let event = EngineEvent::FallbackEnabled(FallbackEnabledEvent {
            price,
            timestamp: now,
        });

        self.commit(staged, event, now)
    }

    /// Disable the fallback price. Owner only.
    ///
    /// The stored price value is kept so a later enable can reuse it.
    pub fn disable_fallback(&mut self, caller: AccountId, now: u64) -> Result<u64> {
        self.require_owner(&caller)?;

        let mut staged = self.state.clone();
        staged.fallback.enabled = false;

        let event = EngineEvent::FallbackDisabled(FallbackDisabledEvent { timestamp: now });

        self.commit(staged, event, now)
    }

    /// Change the fallback price value without toggling it. Owner only.
    pub fn set_fallback_price(&mut self, caller: AccountId, price: u64, now: u64) -> Result<u64> {
        self.require_owner(&caller)?;
        validate_fallback_price(price)?;

        let mut staged = self.state.clone();
        let previous = staged.fallback.price;
        staged.fallback.price = price;

        let event = EngineEvent::FallbackPriceSet(FallbackPriceSetEvent {
            previous,
            price,
            timestamp: now,
        });

        self.commit(staged, event, now)
    }

    /// Replace the price feed. Owner only.
    ///
    /// Takes effect from the next price read.
    pub fn set_feed(
        &mut self,
        caller: AccountId,
        feed: Box<dyn PriceFeed>,
        now: u64,
    ) -> Result<u64> {
        self.require_owner(&caller)?;

        let description = feed.description();
        let staged = self.state.clone();

        let event = EngineEvent::FeedUpdated(FeedUpdatedEvent {
            description,
            timestamp: now,
        });

        let sequence = self.commit(staged, event, now)?;
        self.oracle.set_feed(feed);

        Ok(sequence)
    }

    /// Hand ownership to another account. Owner only.
    pub fn transfer_ownership(
        &mut self,
        caller: AccountId,
        new_owner: AccountId,
        now: u64,
    ) -> Result<u64> {
        self.require_owner(&caller)?;

        if new_owner.is_zero() {
            return Err(Error::InvalidParameter {
                name: "new_owner".into(),
                reason: "ownership cannot be transferred to the zero account".into(),
            });
        }

        let mut staged = self.state.clone();
        let previous_owner = staged.owner;
        staged.owner = new_owner;

        let event = EngineEvent::OwnershipTransferred(OwnershipTransferredEvent {
            previous_owner,
            new_owner,
            timestamp: now,
        });

        self.commit(staged, event, now)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    fn quote(&self, now: u64) -> Result<PriceQuote> {
        self.oracle.quote(&self.state.fallback, now)
    }

    /// Resolve the current price
    pub fn current_price(&self, now: u64) -> Result<PriceQuote> {
        self.quote(now)
    }

    /// Tokens a deposit of `amount` would mint right now
    pub fn preview_deposit(&self, amount: ReserveAmount, now: u64) -> Result<TokenAmount> {
        validate_non_zero(amount.micros())?;
        let quote = self.quote(now)?;
        let tokens = convert::tokens_for_reserve(&self.state.params, amount.micros(), quote.price)?;
        Ok(TokenAmount::from_units(tokens))
    }

    /// Reserve a redemption of `tokens` would return right now
    pub fn preview_redeem(&self, tokens: TokenAmount, now: u64) -> Result<ReserveAmount> {
        validate_non_zero(tokens.units())?;
        let quote = self.quote(now)?;
        let payout = convert::reserve_for_tokens(&self.state.params, tokens.units(), quote.price)?;
        Ok(ReserveAmount::from_micros(payout))
    }

    /// Smallest deposit that mints at least one token right now
    pub fn min_deposit(&self, now: u64) -> Result<ReserveAmount> {
        let quote = self.quote(now)?;
        let minimum = convert::min_deposit(&self.state.params, quote.price)?;
        Ok(ReserveAmount::from_micros(minimum))
    }

    /// Token balance of an account
    pub fn balance_of(&self, account: &AccountId) -> TokenAmount {
        self.state.token.balance_of(account)
    }

    /// Reserve balance of an account
    pub fn reserve_balance_of(&self, account: &AccountId) -> ReserveAmount {
        self.state.reserve.balance_of(account)
    }

    /// Remaining deposit allowance an account has granted the vault
    pub fn allowance_of(&self, account: &AccountId) -> ReserveAmount {
        self.state.reserve.allowance(account, &self.state.vault)
    }

    /// Total token supply
    pub fn total_supply(&self) -> TokenAmount {
        self.state.token.total_supply()
    }

    /// Reserve held by the vault
    pub fn vault_reserve(&self) -> ReserveAmount {
        self.state.reserve.balance_of(&self.state.vault)
    }

    /// Number of token holders
    pub fn holder_count(&self) -> usize {
        self.state.token.holder_count()
    }

    /// Current owner
    pub fn owner(&self) -> AccountId {
        self.state.owner
    }

    /// Vault account
    pub fn vault_account(&self) -> AccountId {
        self.state.vault
    }

    /// Engine parameters
    pub fn params(&self) -> &EngineParams {
        &self.state.params
    }

    /// Fallback price configuration
    pub fn fallback(&self) -> FallbackPrice {
        self.state.fallback
    }

    /// Description of the current price feed
    pub fn feed_description(&self) -> String {
        self.oracle.description()
    }

    /// Sequence number of the last committed operation
    pub fn last_sequence(&self) -> u64 {
        self.state.last_sequence
    }

    /// Hash of the committed state
    pub fn state_hash(&self) -> Hash {
        self.state.hash()
    }

    /// Re-verify the ledger invariants on the committed state
    pub fn check_invariants(&self) -> Result<()> {
        self.state.verify_invariants()
    }

    /// Take a verifiable snapshot of the committed state
    pub fn snapshot(&self, now: u64) -> StateSnapshot {
        StateSnapshot::create(&self.state, now)
    }

    /// Events committed in this session
    pub fn session_events(&self) -> &EventLog {
        &self.events
    }

    /// Most recent journaled events, oldest first
    pub fn recent_events(&self, limit: usize) -> Result<Vec<(u64, EngineEvent)>> {
        self.state_manager.load_events(limit)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
