//! Price feed abstraction.
//!
//! This module defines the upstream feed interface and two in-process
//! implementations:
//! - [`StaticFeed`]: a settable fixed answer for tests and local runs
//! - [`CachedFeed`]: a slot an async fetcher fills and the engine reads
//!
//! A feed returns raw signed answers in its own decimals; normalization
//! and fallback handling live in [`crate::oracle::source`].

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// FEED ANSWER
// ═══════════════════════════════════════════════════════════════════════════════

/// A raw answer from a price feed
///
/// The value is signed because upstream feeds can report zero or negative
/// answers when they malfunction. Consumers must check [`is_positive`]
/// (or go through the oracle) before using the value.
///
/// [`is_positive`]: FeedAnswer::is_positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedAnswer {
    /// Raw answer in the feed's own decimals
    pub value: i64,
    /// Decimal places of `value`
    pub decimals: u8,
    /// Unix timestamp when the answer was produced
    pub updated_at: u64,
}

impl FeedAnswer {
    /// Create a new feed answer
    pub fn new(value: i64, decimals: u8, updated_at: u64) -> Self {
        Self {
            value,
            decimals,
            updated_at,
        }
    }

    /// Check if the answer is usable as a price
    pub fn is_positive(&self) -> bool {
        self.value > 0
    }

    /// Get age of the answer in seconds
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.updated_at)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE FEED TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Upstream source of raw price answers
pub trait PriceFeed: Send + Sync {
    /// Get the latest raw answer
    fn latest_answer(&self) -> Result<FeedAnswer>;

    /// Human-readable description of the feed
    fn description(&self) -> String;
}

impl<T: PriceFeed + ?Sized> PriceFeed for Arc<T> {
    fn latest_answer(&self) -> Result<FeedAnswer> {
        (**self).latest_answer()
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC FEED
// ═══════════════════════════════════════════════════════════════════════════════

/// A feed that serves a fixed answer until told otherwise.
///
/// The answer sits behind a mutex so a shared handle (for example an
/// `Arc<StaticFeed>` given to the engine) can be repointed at runtime.
#[derive(Debug)]
pub struct StaticFeed {
    /// Current answer
    answer: Mutex<FeedAnswer>,
    /// Feed description
    description: String,
}

impl StaticFeed {
    /// Create a feed serving the given answer
    pub fn new(answer: FeedAnswer) -> Self {
        Self::with_description(answer, "static feed")
    }

    /// Create a feed with a custom description
    pub fn with_description(answer: FeedAnswer, description: impl Into<String>) -> Self {
        Self {
            answer: Mutex::new(answer),
            description: description.into(),
        }
    }

    /// Replace the served answer
    pub fn set_answer(&self, answer: FeedAnswer) -> Result<()> {
        let mut guard = self
            .answer
            .lock()
            .map_err(|_| Error::Internal("static feed mutex poisoned".into()))?;
        *guard = answer;
        Ok(())
    }
}

impl PriceFeed for StaticFeed {
    fn latest_answer(&self) -> Result<FeedAnswer> {
        self.answer
            .lock()
            .map(|a| *a)
            .map_err(|_| Error::Internal("static feed mutex poisoned".into()))
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHED FEED
// ═══════════════════════════════════════════════════════════════════════════════

/// A feed fed by an external producer.
///
/// Starts empty and reports [`Error::FeedUnavailable`] until the first
/// [`store`](CachedFeed::store). Bridges async fetchers to the synchronous
/// [`PriceFeed`] the engine reads.
#[derive(Debug)]
pub struct CachedFeed {
    /// Most recent stored answer, if any
    answer: Mutex<Option<FeedAnswer>>,
    /// Feed description
    description: String,
}

impl CachedFeed {
    /// Create an empty cached feed
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            answer: Mutex::new(None),
            description: description.into(),
        }
    }

    /// Store a fresh answer
    pub fn store(&self, answer: FeedAnswer) -> Result<()> {
        let mut guard = self
            .answer
            .lock()
            .map_err(|_| Error::Internal("cached feed mutex poisoned".into()))?;
        *guard = Some(answer);
        Ok(())
    }

    /// Check whether any answer has been stored yet
    pub fn is_empty(&self) -> bool {
        self.answer.lock().map(|a| a.is_none()).unwrap_or(true)
    }
}

impl PriceFeed for CachedFeed {
    fn latest_answer(&self) -> Result<FeedAnswer> {
        let guard = self
            .answer
            .lock()
            .map_err(|_| Error::Internal("cached feed mutex poisoned".into()))?;
        guard.ok_or_else(|| Error::FeedUnavailable {
            reason: "no answer cached yet".into(),
        })
    }

    fn description(&self) -> String {
        self.description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_positivity() {
        assert!(FeedAnswer::new(1, 8, 0).is_positive());
        assert!(!FeedAnswer::new(0, 8, 0).is_positive());
        assert!(!FeedAnswer::new(-1, 8, 0).is_positive());
    }

    #[test]
    fn test_answer_age_saturates() {
        let answer = FeedAnswer::new(100, 8, 1_000);
        assert_eq!(answer.age(1_060), 60);
        assert_eq!(answer.age(500), 0);
    }

    #[test]
    fn test_static_feed_serves_and_replaces() {
        let feed = StaticFeed::new(FeedAnswer::new(260_000_000, 6, 10));
        assert_eq!(feed.latest_answer().unwrap().value, 260_000_000);

        feed.set_answer(FeedAnswer::new(270_000_000, 6, 20)).unwrap();
        let answer = feed.latest_answer().unwrap();
        assert_eq!(answer.value, 270_000_000);
        assert_eq!(answer.updated_at, 20);
    }

    #[test]
    fn test_static_feed_shared_handle() {
        let feed = Arc::new(StaticFeed::new(FeedAnswer::new(100, 6, 0)));
        let boxed: Box<dyn PriceFeed> = Box::new(feed.clone());

        feed.set_answer(FeedAnswer::new(-5, 6, 1)).unwrap();
        assert_eq!(boxed.latest_answer().unwrap().value, -5);
    }

    #[test]
    fn test_cached_feed_starts_unavailable() {
        let feed = CachedFeed::new("test cache");
        assert!(feed.is_empty());

        let err = feed.latest_answer().unwrap_err();
        assert!(matches!(err, Error::FeedUnavailable { .. }));
    }

    #[test]
    fn test_cached_feed_serves_after_store() {
        let feed = CachedFeed::new("test cache");
        feed.store(FeedAnswer::new(260_000_000, 6, 42)).unwrap();

        assert!(!feed.is_empty());
        assert_eq!(feed.latest_answer().unwrap().value, 260_000_000);
    }
}
