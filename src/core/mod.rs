//! Core modules for the synthetic token engine.
//!
//! This module contains the fundamental building blocks:
//! - Engine parameters and configuration
//! - Price-based conversion arithmetic
//! - Synthetic token ledger
//! - Reserve asset types and the stablecoin interface

pub mod collateral;
pub mod config;
pub mod convert;
pub mod token;

pub use collateral::*;
pub use config::*;
pub use convert::*;
pub use token::*;
