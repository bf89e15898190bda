//! Error types for the synthmint engine.
//!
//! This module defines all error types used throughout the engine,
//! providing clear and actionable error messages.

use thiserror::Error;

/// Result type alias for synthmint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the synthmint engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Ledger Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Account holds fewer tokens than the operation needs
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Required token amount
        required: u64,
        /// Available token amount
        available: u64,
    },

    /// Reserve cannot cover the requested payout
    #[error("Insufficient reserve: required {required}, available {available}")]
    InsufficientReserve {
        /// Required reserve amount
        required: u64,
        /// Available reserve amount
        available: u64,
    },

    /// Reference-asset transfer rejected by the reserve token
    #[error("Reserve transfer failed: {reason}")]
    TransferFailed {
        /// Reason reported by the reserve token
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Oracle Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Live feed answered with a non-positive price and no fallback is active
    #[error("Invalid price from feed: {value}")]
    InvalidPrice {
        /// Raw feed answer
        value: i64,
    },

    /// Price is stale (not updated within the configured window)
    #[error("Price is stale: last update {last_update}s ago, max allowed {max_age}s")]
    StalePrice {
        /// Seconds since last update
        last_update: u64,
        /// Maximum allowed age in seconds
        max_age: u64,
    },

    /// Feed could not produce an answer at all
    #[error("Price feed unavailable: {reason}")]
    FeedUnavailable {
        /// Reason the feed failed
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Not authorized to perform this action
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Non-zero input would round to zero output
    #[error("Amount {amount} too small: minimum {minimum}")]
    AmountTooSmall {
        /// Rejected input amount
        amount: u64,
        /// Smallest input that currently produces output
        minimum: u64,
    },

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Engine Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Storage already holds an initialized engine state
    #[error("Engine already initialized")]
    AlreadyInitialized,

    /// Storage holds no engine state yet
    #[error("Engine not initialized")]
    NotInitialized,

    /// Persisted state was written by a newer logic revision
    #[error("Unsupported state version {found}, this build supports up to {supported}")]
    UnsupportedStateVersion {
        /// Version found in storage
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },

    /// Invariant violation detected
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ═══════════════════════════════════════════════════════════════════
    // Internal Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns true if this error is recoverable by the caller
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InsufficientBalance { .. }
                | Error::InsufficientReserve { .. }
                | Error::AmountTooSmall { .. }
                | Error::StalePrice { .. }
                | Error::FeedUnavailable { .. }
        )
    }

    /// Returns true if this is a critical error requiring immediate attention
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Error::InvariantViolation(_) | Error::Internal(_) | Error::Overflow { .. }
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Ledger errors: 1xxx
            Error::InsufficientBalance { .. } => 1001,
            Error::InsufficientReserve { .. } => 1002,
            Error::TransferFailed { .. } => 1003,

            // Oracle errors: 3xxx
            Error::InvalidPrice { .. } => 3001,
            Error::StalePrice { .. } => 3002,
            Error::FeedUnavailable { .. } => 3003,

            // Authorization errors: 4xxx
            Error::Unauthorized(_) => 4001,

            // Validation errors: 5xxx
            Error::InvalidParameter { .. } => 5001,
            Error::AmountTooSmall { .. } => 5002,
            Error::Overflow { .. } => 5003,

            // Engine errors: 6xxx
            Error::AlreadyInitialized => 6001,
            Error::NotInitialized => 6002,
            Error::UnsupportedStateVersion { .. } => 6003,
            Error::InvariantViolation(_) => 6004,

            // Serialization errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,

            // Internal errors: 9xxx
            Error::Internal(_) => 9001,
            Error::Storage(_) => 9002,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_unique() {
        // Ensure all error codes are unique
        let codes = vec![
            Error::InsufficientBalance { required: 0, available: 0 }.code(),
            Error::InsufficientReserve { required: 0, available: 0 }.code(),
            Error::TransferFailed { reason: "".into() }.code(),
            Error::InvalidPrice { value: 0 }.code(),
            Error::StalePrice { last_update: 0, max_age: 0 }.code(),
            Error::FeedUnavailable { reason: "".into() }.code(),
            Error::Unauthorized("".into()).code(),
            Error::InvalidParameter { name: "".into(), reason: "".into() }.code(),
            Error::AmountTooSmall { amount: 0, minimum: 0 }.code(),
            Error::Overflow { operation: "".into() }.code(),
            Error::AlreadyInitialized.code(),
            Error::NotInitialized.code(),
            Error::UnsupportedStateVersion { found: 0, supported: 0 }.code(),
            Error::InvariantViolation("".into()).code(),
            Error::Serialization("".into()).code(),
            Error::Deserialization("".into()).code(),
            Error::Internal("".into()).code(),
            Error::Storage("".into()).code(),
        ];

        let mut unique_codes = codes.clone();
        unique_codes.sort();
        unique_codes.dedup();

        assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");
    }

    #[test]
    fn test_error_display() {
        let err = Error::InsufficientBalance {
            required: 1000,
            available: 500,
        };
        assert!(err.to_string().contains("1000"));
        assert!(err.to_string().contains("500"));

        let err = Error::AmountTooSmall { amount: 100, minimum: 260 };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("260"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::InsufficientBalance { required: 0, available: 0 }.is_recoverable());
        assert!(Error::AmountTooSmall { amount: 1, minimum: 2 }.is_recoverable());
        assert!(!Error::Internal("test".into()).is_recoverable());
        assert!(!Error::InvalidPrice { value: -1 }.is_recoverable());
    }

    #[test]
    fn test_is_critical() {
        assert!(Error::InvariantViolation("test".into()).is_critical());
        assert!(Error::Overflow { operation: "test".into() }.is_critical());
        assert!(!Error::Unauthorized("test".into()).is_critical());
        assert!(!Error::InsufficientReserve { required: 0, available: 0 }.is_critical());
    }

    #[test]
    fn test_invalid_price_keeps_raw_answer() {
        let err = Error::InvalidPrice { value: -42 };
        assert!(err.to_string().contains("-42"));
        assert_eq!(err.code(), 3001);
    }
}
