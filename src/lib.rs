//! # Synthmint
//!
//! A collateral-backed synthetic token engine. Users deposit a USD-pegged
//! reserve asset and receive whole-unit synthetic tokens at an oracle
//! price; redemptions burn tokens and return reserve at the then-current
//! price.
//!
//! ## Architecture
//!
//! The engine consists of several core modules:
//!
//! - **Core**: Token and reserve types, conversion arithmetic, configuration
//! - **Oracle**: Price feeds with an operator-set fallback price that overrides them
//! - **Protocol**: The engine that executes operations atomically, and its events
//! - **Storage**: Pluggable persistence with a versioned state blob
//!
//! ## Design Principles
//!
//! - **Deterministic**: Every conversion floors; no operation depends on iteration order
//! - **Atomic**: Operations either fully commit or leave no trace
//! - **Robust**: Fail-safe price handling and invariant checking
//! - **Modular**: Clean separation of concerns
//!
//! ## Example
//!
//! ```rust,ignore
//! use synthmint::prelude::*;
//!
//! // Open an engine over a storage backend and a price feed
//! let mut engine = SynthEngine::open(backend, feed)?;
//!
//! // Deposit reserve for tokens at the current price
//! let receipt = engine.deposit(account, ReserveAmount::from_whole(2_600), now)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod cli;
pub mod core;
pub mod error;
pub mod oracle;
pub mod protocol;
pub mod storage;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{
        collateral::{ReserveAmount, ReserveToken, StableToken},
        config::EngineParams,
        token::{SynthToken, TokenAmount},
    };
    pub use crate::error::{Error, Result};
    pub use crate::oracle::{
        feed::{FeedAnswer, PriceFeed, StaticFeed},
        source::{FallbackPrice, PriceOracle, PriceQuote, QuoteSource},
    };
    pub use crate::protocol::{
        engine::{DepositReceipt, RedeemReceipt, SynthEngine},
        events::EngineEvent,
    };
    pub use crate::storage::{
        backend::{FileStore, InMemoryStore, StorageBackend},
        state::{EngineState, StateManager},
    };
    pub use crate::utils::crypto::{AccountId, Hash};
}

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const ENGINE_NAME: &str = "synthmint";
