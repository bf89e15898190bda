//! Oracle module for price feeds.
//!
//! This module provides price feed functionality:
//! - The [`PriceFeed`] trait and in-process feed implementations
//! - Price resolution with a manual fallback override and decimal normalization
//! - Optional HTTP fetching into a cached feed
//!
//! ## Usage
//!
//! ```rust,ignore
//! use synthmint::oracle::{FallbackPrice, FeedAnswer, PriceOracle, StaticFeed};
//!
//! let feed = StaticFeed::new(FeedAnswer::new(260_000_000, 6, now));
//! let oracle = PriceOracle::new(Box::new(feed));
//!
//! let quote = oracle.quote(&FallbackPrice::disabled(), now)?;
//! ```

pub mod feed;
#[cfg(feature = "http-feed")]
pub mod http;
pub mod source;

pub use feed::*;
#[cfg(feature = "http-feed")]
pub use http::{HttpFeedConfig, HttpFetcher};
pub use source::*;
