//! Engine constants and magic numbers.
//!
//! All engine-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// DECIMAL PRECISION
// ═══════════════════════════════════════════════════════════════════════════════

/// Synthetic token decimals (whole units only, no fractional holdings)
pub const TOKEN_DECIMALS: u8 = 0;

/// Reference-asset decimals (USD-pegged stablecoin convention)
pub const RESERVE_DECIMALS: u8 = 6;

/// Price decimals the engine normalizes every feed answer to
pub const PRICE_DECIMALS: u8 = 6;

/// One whole reference-asset unit in micro-units
pub const RESERVE_UNIT: u64 = 1_000_000;

/// Scale factor matching `PRICE_DECIMALS`
pub const PRICE_SCALE: u64 = 1_000_000;

/// Upper bound on any configured decimal count; keeps 128-bit
/// intermediate products safe for realistic amounts
pub const MAX_DECIMALS: u8 = 18;

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN IDENTITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Default synthetic token name
pub const DEFAULT_TOKEN_NAME: &str = "Synth USD";

/// Default synthetic token symbol
pub const DEFAULT_TOKEN_SYMBOL: &str = "SYNTH";

/// Default reserve token name
pub const DEFAULT_RESERVE_NAME: &str = "Test USD";

/// Default reserve token symbol
pub const DEFAULT_RESERVE_SYMBOL: &str = "TUSD";

// ═══════════════════════════════════════════════════════════════════════════════
// STATE & EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Current persisted-state schema version
pub const STATE_VERSION: u32 = 1;

/// Maximum events retained in the in-memory log
pub const DEFAULT_MAX_EVENTS: usize = 1000;

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Length of an account identifier in bytes
pub const ACCOUNT_ID_LENGTH: usize = 20;

/// Length of a hash in bytes (SHA256)
pub const HASH_LENGTH: usize = 32;
