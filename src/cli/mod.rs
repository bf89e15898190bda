//! Synthmint Command Line Interface.
//!
//! Local configuration and output formatting for the `synthmint` binary.
//! Command dispatch lives in the binary itself.

pub mod config;
pub mod output;

pub use config::*;
pub use output::*;
