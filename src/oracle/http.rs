//! HTTP price fetcher.
//!
//! Fetches price answers from a JSON endpoint and feeds them into a
//! [`CachedFeed`] the engine reads synchronously. The endpoint is
//! expected to respond with a body of the form:
//!
//! ```json
//! { "price": "260.123456" }
//! ```
//!
//! The decimal string is scaled to the configured feed decimals,
//! truncating toward zero. Transport and parse failures surface as
//! [`Error::FeedUnavailable`]; a failed refresh leaves the previous
//! cached answer in place.

use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::oracle::feed::{CachedFeed, FeedAnswer};

// ═══════════════════════════════════════════════════════════════════════════════
// FETCHER CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration for the HTTP price fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpFeedConfig {
    /// Endpoint returning the price JSON
    pub url: String,
    /// Decimal places of produced answers
    pub decimals: u8,
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// User agent string
    pub user_agent: String,
}

impl HttpFeedConfig {
    /// Create a configuration with default transport settings
    pub fn new(url: impl Into<String>, decimals: u8) -> Self {
        Self {
            url: url.into(),
            decimals,
            timeout_ms: 10_000,
            user_agent: format!("{}/{}", crate::ENGINE_NAME, crate::VERSION),
        }
    }
}

/// Expected endpoint response body
#[derive(Debug, Deserialize)]
struct PriceResponse {
    /// Price as a decimal string
    price: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// HTTP FETCHER
// ═══════════════════════════════════════════════════════════════════════════════

/// HTTP-based price fetcher
pub struct HttpFetcher {
    /// HTTP client
    client: Client,
    /// Configuration
    config: HttpFeedConfig,
}

impl HttpFetcher {
    /// Create a new fetcher
    pub fn new(config: HttpFeedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Fetch a single answer from the endpoint
    pub async fn fetch(&self) -> Result<FeedAnswer> {
        let response = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| Error::FeedUnavailable {
                reason: format!("request to {} failed: {}", self.config.url, e),
            })?;

        let data: PriceResponse = response.json().await.map_err(|e| Error::FeedUnavailable {
            reason: format!("unreadable response from {}: {}", self.config.url, e),
        })?;

        let value = parse_price(&data.price, self.config.decimals)?;

        Ok(FeedAnswer::new(value, self.config.decimals, current_timestamp()))
    }

    /// Fetch one answer and store it in the cache
    pub async fn refresh(&self, cache: &CachedFeed) -> Result<()> {
        let answer = self.fetch().await?;
        cache.store(answer)?;
        tracing::info!("Stored feed answer {} from {}", answer.value, self.config.url);
        Ok(())
    }

    /// Refresh the cache on a fixed period until the task is dropped.
    ///
    /// A failed fetch is logged and the previous cached answer stays in
    /// place; the oracle's staleness check catches a cache that stops
    /// being refreshed.
    pub async fn run(&self, cache: &CachedFeed, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh(cache).await {
                tracing::warn!("Price fetch failed: {}", e);
            }
        }
    }
}

/// Get current unix timestamp
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Scale a decimal price string to an integer answer.
///
/// Truncates toward zero past the requested precision. Negative values
/// are preserved so a broken upstream surfaces as an invalid answer
/// instead of being masked here.
fn parse_price(price: &str, decimals: u8) -> Result<i64> {
    let value: Decimal = price.trim().parse().map_err(|_| Error::FeedUnavailable {
        reason: format!("'{}' is not a decimal price", price.trim()),
    })?;

    let factor = 10u64
        .checked_pow(decimals as u32)
        .ok_or(Error::Overflow {
            operation: "price scale factor".into(),
        })?;

    let scaled = value
        .checked_mul(Decimal::from(factor))
        .ok_or(Error::Overflow {
            operation: "scale fetched price".into(),
        })?;

    scaled.trunc().to_i64().ok_or(Error::Overflow {
        operation: "scale fetched price".into(),
    })
}
