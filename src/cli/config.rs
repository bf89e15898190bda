//! CLI Configuration.
//!
//! Local state for the command-line tool: the acting account identity and
//! the simulated feed answer the deployment prices against. The engine
//! state itself lives in the storage backend, not here.

use crate::error::{Error, Result};
use crate::oracle::feed::FeedAnswer;
use crate::utils::constants::{MAX_DECIMALS, PRICE_DECIMALS, PRICE_SCALE};
use crate::utils::crypto::AccountId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ═══════════════════════════════════════════════════════════════════════════════
// CLI CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// CLI Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Data directory
    pub data_dir: PathBuf,
    /// Acting account for commands
    pub account: AccountId,
    /// Simulated feed answer (10^-`feed_decimals` units)
    pub feed_value: i64,
    /// Decimals of the simulated feed answer
    pub feed_decimals: u8,
    /// Timestamp of the last feed answer update
    pub feed_updated_at: u64,
    /// When this configuration was created (RFC 3339)
    pub created_at: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            account: AccountId::zero(),
            feed_value: 260 * PRICE_SCALE as i64,
            feed_decimals: PRICE_DECIMALS,
            feed_updated_at: 0,
            created_at: String::new(),
        }
    }
}

impl CliConfig {
    /// Create a configuration for a fresh deployment
    pub fn new(data_dir: PathBuf, account: AccountId) -> Self {
        Self {
            data_dir,
            account,
            created_at: chrono::Utc::now().to_rfc3339(),
            ..Default::default()
        }
    }

    /// Load from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Save to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create config directory: {}", e)))?;
        }

        std::fs::write(path, content)
            .map_err(|e| Error::Storage(format!("Failed to write config: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("SYNTHMINT_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Ok(hex) = std::env::var("SYNTHMINT_ACCOUNT") {
            if let Ok(account) = AccountId::from_hex(&hex) {
                self.account = account;
            }
        }

        if let Ok(value) = std::env::var("SYNTHMINT_FEED_VALUE") {
            if let Ok(parsed) = value.parse() {
                self.feed_value = parsed;
            }
        }
    }

    /// Config file path inside a data directory
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("config.json")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.feed_decimals > MAX_DECIMALS {
            return Err(Error::InvalidParameter {
                name: "feed_decimals".into(),
                reason: format!("exceeds maximum {} decimals", MAX_DECIMALS),
            });
        }

        if self.account.is_zero() {
            return Err(Error::InvalidParameter {
                name: "account".into(),
                reason: "acting account is not set".into(),
            });
        }

        Ok(())
    }

    /// The simulated feed answer in oracle form
    pub fn feed_answer(&self) -> FeedAnswer {
        FeedAnswer::new(self.feed_value, self.feed_decimals, self.feed_updated_at)
    }

    /// Replace the simulated feed answer
    pub fn set_feed_answer(&mut self, value: i64, updated_at: u64) {
        self.feed_value = value;
        self.feed_updated_at = updated_at;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Get default data directory
pub fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".synthmint");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/synthmint");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("synthmint");
        }
    }

    PathBuf::from(".synthmint")
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CliConfig::default();
        assert_eq!(config.feed_value, 260_000_000);
        assert_eq!(config.feed_decimals, PRICE_DECIMALS);
    }

    #[test]
    fn test_default_validation_fails_on_zero_account() {
        let config = CliConfig::default();
        assert!(config.validate().is_err());

        let config = CliConfig::new(default_data_dir(), AccountId::from_seed(b"cli"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = CliConfig::path_in(dir.path());

        let mut config = CliConfig::new(dir.path().to_path_buf(), AccountId::from_seed(b"cli"));
        config.set_feed_answer(275_500_000, 1_700_000_000);
        config.save(&path).unwrap();

        let loaded = CliConfig::load(&path).unwrap();
        assert_eq!(loaded.account, config.account);
        assert_eq!(loaded.feed_value, 275_500_000);
        assert_eq!(loaded.feed_updated_at, 1_700_000_000);
        assert_eq!(loaded.created_at, config.created_at);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(CliConfig::load(&path).is_err());
    }

    #[test]
    fn test_feed_answer_conversion() {
        let mut config = CliConfig::default();
        config.set_feed_answer(-5, 42);

        let answer = config.feed_answer();
        assert_eq!(answer.value, -5);
        assert_eq!(answer.decimals, PRICE_DECIMALS);
        assert_eq!(answer.updated_at, 42);
        assert!(!answer.is_positive());
    }
}
