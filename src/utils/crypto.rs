//! Hashes and account identifiers.
//!
//! This module provides the two identity primitives the engine needs:
//! - Hashes (SHA256) for state and event fingerprints
//! - Opaque 20-byte account identifiers for balance bookkeeping
//!
//! Both serialize as hex strings so persisted state stays human-inspectable.

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{Error, Result};
use crate::utils::constants::{ACCOUNT_ID_LENGTH, HASH_LENGTH};

// ═══════════════════════════════════════════════════════════════════════════════
// HASH
// ═══════════════════════════════════════════════════════════════════════════════

/// A 32-byte cryptographic hash
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_LENGTH]);

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != HASH_LENGTH {
            return Err(serde::de::Error::custom(format!(
                "expected {} bytes, got {}",
                HASH_LENGTH,
                bytes.len()
            )));
        }
        let mut arr = [0u8; HASH_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Hash(arr))
    }
}

impl Hash {
    /// Create a new hash from bytes
    pub fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create a hash from a slice (must be exactly 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != HASH_LENGTH {
            return Err(Error::InvalidParameter {
                name: "hash".into(),
                reason: format!("expected {} bytes, got {}", HASH_LENGTH, slice.len()),
            });
        }
        let mut bytes = [0u8; HASH_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Compute SHA256 hash of data
    pub fn sha256(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut bytes = [0u8; HASH_LENGTH];
        bytes.copy_from_slice(&result);
        Self(bytes)
    }

    /// Get the hash as bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| Error::InvalidParameter {
            name: "hash".into(),
            reason: e.to_string(),
        })?;
        Self::from_slice(&bytes)
    }

    /// Zero hash (all zeros)
    pub fn zero() -> Self {
        Self([0u8; HASH_LENGTH])
    }

    /// Check if hash is zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LENGTH]
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT ID
// ═══════════════════════════════════════════════════════════════════════════════

/// An opaque 20-byte account identifier
///
/// Stands in for whatever identity the host system uses (addresses,
/// public-key hashes). The engine only needs equality and a stable
/// ordering for deterministic balance maps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl Serialize for AccountId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        AccountId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl AccountId {
    /// Create a new account id from bytes
    pub fn new(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create an account id from a slice (must be exactly 20 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != ACCOUNT_ID_LENGTH {
            return Err(Error::InvalidParameter {
                name: "account_id".into(),
                reason: format!(
                    "expected {} bytes, got {}",
                    ACCOUNT_ID_LENGTH,
                    slice.len()
                ),
            });
        }
        let mut bytes = [0u8; ACCOUNT_ID_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Derive a deterministic account id from seed data
    ///
    /// First 20 bytes of SHA256(seed). Used for well-known accounts
    /// (the vault) and for reproducible test identities.
    pub fn from_seed(seed: &[u8]) -> Self {
        let digest = Hash::sha256(seed);
        let mut bytes = [0u8; ACCOUNT_ID_LENGTH];
        bytes.copy_from_slice(&digest.as_bytes()[..ACCOUNT_ID_LENGTH]);
        Self(bytes)
    }

    /// Generate a random account id
    pub fn random() -> Self {
        let mut bytes = [0u8; ACCOUNT_ID_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get the id as bytes
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    /// The all-zero account id
    pub fn zero() -> Self {
        Self([0u8; ACCOUNT_ID_LENGTH])
    }

    /// Check if this is the all-zero id
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ACCOUNT_ID_LENGTH]
    }

    /// Convert to hex string (no prefix)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string, with or without a 0x prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| Error::InvalidParameter {
            name: "account_id".into(),
            reason: e.to_string(),
        })?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId(0x{})", &self.to_hex()[..8])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
