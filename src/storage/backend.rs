//! Storage backend implementations.
//!
//! This module provides different storage backends:
//! - InMemoryStore: Fast, ephemeral storage for testing
//! - FileStore: JSON file-based persistent storage, human-inspectable
//! - BinaryStore: Compact binary format
//!
//! All backends keep their working set in an ordered map, so key listings
//! come back sorted and the on-disk files are byte-stable for identical
//! contents. File-backed stores write through a temp file and rename, a
//! crash mid-save leaves the previous file intact.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key type for storage operations
pub type StorageKey = Vec<u8>;

/// Value type for storage operations
pub type StorageValue = Vec<u8>;

/// Trait for storage backends
pub trait StorageBackend: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>>;

    /// Set a value for a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// List all keys with a given prefix, in sorted order
    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>>;

    /// Flush any pending writes to persistent storage
    fn flush(&self) -> Result<()>;

    /// Get all keys, in sorted order
    fn keys(&self) -> Result<Vec<StorageKey>>;

    /// Clear all data
    fn clear(&self) -> Result<()>;
}

fn lock_error<T>(_: T) -> Error {
    Error::Internal("storage lock poisoned".into())
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend (for testing and ephemeral use)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut data = self.data.write().map_err(lock_error)?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut data = self.data.write().map_err(lock_error)?;
        Ok(data.remove(key).is_some())
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.contains_key(key))
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn flush(&self) -> Result<()> {
        // Nothing to flush
        Ok(())
    }

    fn keys(&self) -> Result<Vec<StorageKey>> {
        let data = self.data.read().map_err(lock_error)?;
        Ok(data.keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        let mut data = self.data.write().map_err(lock_error)?;
        data.clear();
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE-BASED STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// File-based storage backend using JSON with hex-encoded entries
#[derive(Debug)]
pub struct FileStore {
    /// Base directory for storage
    base_path: PathBuf,
    /// In-memory working set
    cache: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Whether the working set has unsaved changes
    dirty: RwLock<bool>,
}

impl FileStore {
    /// Create a new file store at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| Error::Storage(format!("Failed to create storage directory: {}", e)))?;
        }

        let store = Self {
            base_path,
            cache: RwLock::new(BTreeMap::new()),
            dirty: RwLock::new(false),
        };

        store.load_from_disk()?;

        Ok(store)
    }

    /// Get the path of the data file
    fn data_file_path(&self) -> PathBuf {
        self.base_path.join("engine.json")
    }

    fn load_from_disk(&self) -> Result<()> {
        let path = self.data_file_path();

        if !path.exists() {
            return Ok(());
        }

        let file = File::open(&path)
            .map_err(|e| Error::Storage(format!("Failed to open data file: {}", e)))?;

        let reader = BufReader::new(file);

        // JSON with hex-encoded keys and values
        let data: BTreeMap<String, String> = serde_json::from_reader(reader)
            .map_err(|e| Error::Storage(format!("Failed to parse data file: {}", e)))?;

        let mut cache = self.cache.write().map_err(lock_error)?;

        for (key_hex, value_hex) in data {
            let key = hex::decode(&key_hex)
                .map_err(|e| Error::Storage(format!("Invalid key in data file: {}", e)))?;
            let value = hex::decode(&value_hex)
                .map_err(|e| Error::Storage(format!("Invalid value in data file: {}", e)))?;
            cache.insert(key, value);
        }

        Ok(())
    }

    fn save_to_disk(&self) -> Result<()> {
        let cache = self.cache.read().map_err(lock_error)?;

        let data: BTreeMap<String, String> = cache
            .iter()
            .map(|(k, v)| (hex::encode(k), hex::encode(v)))
            .collect();

        let bytes = serde_json::to_vec_pretty(&data)
            .map_err(|e| Error::Storage(format!("Failed to encode data file: {}", e)))?;

        atomic_write(&self.data_file_path(), &bytes)?;

        let mut dirty = self.dirty.write().map_err(lock_error)?;
        *dirty = false;

        Ok(())
    }

    fn mark_dirty(&self) -> Result<()> {
        let mut dirty = self.dirty.write().map_err(lock_error)?;
        *dirty = true;
        Ok(())
    }
}

impl StorageBackend for FileStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        let cache = self.cache.read().map_err(lock_error)?;
        Ok(cache.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut cache = self.cache.write().map_err(lock_error)?;
        cache.insert(key.to_vec(), value.to_vec());
        drop(cache);

        self.mark_dirty()
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut cache = self.cache.write().map_err(lock_error)?;
        let existed = cache.remove(key).is_some();
        drop(cache);

        if existed {
            self.mark_dirty()?;
        }

        Ok(existed)
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let cache = self.cache.read().map_err(lock_error)?;
        Ok(cache.contains_key(key))
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        let cache = self.cache.read().map_err(lock_error)?;
        Ok(cache
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn flush(&self) -> Result<()> {
        let dirty = *self.dirty.read().map_err(lock_error)?;
        if dirty {
            self.save_to_disk()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<StorageKey>> {
        let cache = self.cache.read().map_err(lock_error)?;
        Ok(cache.keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        let mut cache = self.cache.write().map_err(lock_error)?;
        cache.clear();
        drop(cache);

        self.mark_dirty()
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Best-effort flush of unsaved changes
        let _ = self.flush();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINARY STORE (COMPACT FORMAT)
// ═══════════════════════════════════════════════════════════════════════════════

/// Binary storage backend using bincode for compact serialization
#[derive(Debug)]
pub struct BinaryStore {
    /// Base directory for storage
    base_path: PathBuf,
    /// In-memory working set
    cache: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Whether the working set has unsaved changes
    dirty: RwLock<bool>,
}

impl BinaryStore {
    /// Create a new binary store at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)
                .map_err(|e| Error::Storage(format!("Failed to create storage directory: {}", e)))?;
        }

        let store = Self {
            base_path,
            cache: RwLock::new(BTreeMap::new()),
            dirty: RwLock::new(false),
        };

        store.load_from_disk()?;

        Ok(store)
    }

    fn data_file_path(&self) -> PathBuf {
        self.base_path.join("engine.bin")
    }

    fn load_from_disk(&self) -> Result<()> {
        let path = self.data_file_path();

        if !path.exists() {
            return Ok(());
        }

        let data = fs::read(&path)
            .map_err(|e| Error::Storage(format!("Failed to read data file: {}", e)))?;

        let loaded: BTreeMap<Vec<u8>, Vec<u8>> = bincode::deserialize(&data)
            .map_err(|e| Error::Storage(format!("Failed to decode data file: {}", e)))?;

        let mut cache = self.cache.write().map_err(lock_error)?;
        *cache = loaded;

        Ok(())
    }

    fn save_to_disk(&self) -> Result<()> {
        let cache = self.cache.read().map_err(lock_error)?;

        let bytes = bincode::serialize(&*cache)
            .map_err(|e| Error::Storage(format!("Failed to encode data file: {}", e)))?;

        atomic_write(&self.data_file_path(), &bytes)?;

        let mut dirty = self.dirty.write().map_err(lock_error)?;
        *dirty = false;

        Ok(())
    }

    fn mark_dirty(&self) -> Result<()> {
        let mut dirty = self.dirty.write().map_err(lock_error)?;
        *dirty = true;
        Ok(())
    }
}

impl StorageBackend for BinaryStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        let cache = self.cache.read().map_err(lock_error)?;
        Ok(cache.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut cache = self.cache.write().map_err(lock_error)?;
        cache.insert(key.to_vec(), value.to_vec());
        drop(cache);

        self.mark_dirty()
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut cache = self.cache.write().map_err(lock_error)?;
        let existed = cache.remove(key).is_some();
        drop(cache);

        if existed {
            self.mark_dirty()?;
        }

        Ok(existed)
    }

    fn exists(&self, key: &[u8]) -> Result<bool> {
        let cache = self.cache.read().map_err(lock_error)?;
        Ok(cache.contains_key(key))
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        let cache = self.cache.read().map_err(lock_error)?;
        Ok(cache
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn flush(&self) -> Result<()> {
        let dirty = *self.dirty.read().map_err(lock_error)?;
        if dirty {
            self.save_to_disk()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<StorageKey>> {
        let cache = self.cache.read().map_err(lock_error)?;
        Ok(cache.keys().cloned().collect())
    }

    fn clear(&self) -> Result<()> {
        let mut cache = self.cache.write().map_err(lock_error)?;
        cache.clear();
        drop(cache);

        self.mark_dirty()
    }
}

impl Drop for BinaryStore {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Write bytes through a temp file and rename it into place
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)
        .map_err(|e| Error::Storage(format!("Failed to write data file: {}", e)))?;
    fs::rename(&tmp, path)
        .map_err(|e| Error::Storage(format!("Failed to replace data file: {}", e)))?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED STORE WRAPPER
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-safe wrapper around a storage backend
pub struct TypedStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Create a new typed store
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get a typed value
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        match self.backend.get(key)? {
            Some(data) => {
                let value = bincode::deserialize(&data).map_err(|e| {
                    Error::Deserialization(format!("Failed to deserialize value: {}", e))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a typed value
    pub fn set<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        let data = bincode::serialize(value)
            .map_err(|e| Error::Serialization(format!("Failed to serialize value: {}", e)))?;
        self.backend.set(key, &data)
    }

    /// Delete a value
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.backend.delete(key)
    }

    /// Check if a key exists
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.backend.exists(key)
    }

    /// List keys with prefix
    pub fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        self.backend.list_prefix(prefix)
    }

    /// Flush pending writes
    pub fn flush(&self) -> Result<()> {
        self.backend.flush()
    }

    /// Get all keys
    pub fn keys(&self) -> Result<Vec<StorageKey>> {
        self.backend.keys()
    }

    /// Clear all data
    pub fn clear(&self) -> Result<()> {
        self.backend.clear()
    }

    /// Get the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PREFIXES
// ═══════════════════════════════════════════════════════════════════════════════

/// Key prefixes for different data types
pub mod prefixes {
    /// Engine state prefix
    pub const STATE: &[u8] = b"state:";
    /// Event journal prefix
    pub const EVENT: &[u8] = b"evt:";
}

/// Create a key with a prefix
pub fn make_key(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(prefix.len() + key.len());
    result.extend_from_slice(prefix);
    result.extend_from_slice(key);
    result
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryStore::new();

        store.set(b"key1", b"value1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));

        assert_eq!(store.get(b"nonexistent").unwrap(), None);

        assert!(store.exists(b"key1").unwrap());
        assert!(!store.exists(b"nonexistent").unwrap());

        assert!(store.delete(b"key1").unwrap());
        assert!(!store.exists(b"key1").unwrap());
        assert!(!store.delete(b"key1").unwrap());
    }

    #[test]
    fn test_prefix_listing_is_sorted() {
        let store = InMemoryStore::new();

        store.set(b"evt:00000002", b"b").unwrap();
        store.set(b"evt:00000001", b"a").unwrap();
        store.set(b"state:current", b"s").unwrap();

        let event_keys = store.list_prefix(b"evt:").unwrap();
        assert_eq!(event_keys.len(), 2);
        assert_eq!(event_keys[0], b"evt:00000001".to_vec());
        assert_eq!(event_keys[1], b"evt:00000002".to_vec());

        assert_eq!(store.list_prefix(b"state:").unwrap().len(), 1);
    }

    #[test]
    fn test_typed_store() {
        let store = TypedStore::new(InMemoryStore::new());

        store.set(b"number", &12345u64).unwrap();
        let value: u64 = store.get(b"number").unwrap().unwrap();
        assert_eq!(value, 12345);

        store.set(b"string", &"hello".to_string()).unwrap();
        let value: String = store.get(b"string").unwrap().unwrap();
        assert_eq!(value, "hello");
    }

    #[test]
    fn test_make_key() {
        let key = make_key(prefixes::EVENT, b"12345");
        assert!(key.starts_with(b"evt:"));
        assert_eq!(&key[4..], b"12345");
    }

    #[test]
    fn test_file_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path()).unwrap();

        store.set(b"key1", b"value1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));

        store.flush().unwrap();
        assert!(temp_dir.path().join("engine.json").exists());
        // No leftover temp file after a clean save
        assert!(!temp_dir.path().join("engine.tmp").exists());
    }

    #[test]
    fn test_file_store_persistence() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = FileStore::new(&path).unwrap();
            store.set(b"persistent", b"data").unwrap();
            store.flush().unwrap();
        }

        {
            let store = FileStore::new(&path).unwrap();
            assert_eq!(store.get(b"persistent").unwrap(), Some(b"data".to_vec()));
        }
    }

    #[test]
    fn test_file_store_flushes_on_drop() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = FileStore::new(&path).unwrap();
            store.set(b"dropped", b"still here").unwrap();
            // No explicit flush
        }

        let store = FileStore::new(&path).unwrap();
        assert_eq!(store.get(b"dropped").unwrap(), Some(b"still here".to_vec()));
    }

    #[test]
    fn test_binary_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = BinaryStore::new(temp_dir.path()).unwrap();

        store.set(b"key1", b"value1").unwrap();
        assert_eq!(store.get(b"key1").unwrap(), Some(b"value1".to_vec()));

        store.flush().unwrap();
        assert!(temp_dir.path().join("engine.bin").exists());
    }

    #[test]
    fn test_binary_store_persistence() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_path_buf();

        {
            let store = BinaryStore::new(&path).unwrap();
            store.set(b"persistent", b"data").unwrap();
            store.flush().unwrap();
        }

        {
            let store = BinaryStore::new(&path).unwrap();
            assert_eq!(store.get(b"persistent").unwrap(), Some(b"data".to_vec()));
        }
    }
}
