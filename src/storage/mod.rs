//! Storage module for persistent data management.
//!
//! This module provides persistence for the engine:
//! - The single versioned state blob
//! - The append-only event journal
//! - Snapshots for backup and verification
//!
//! ## Backends
//!
//! - **InMemoryStore**: Fast, ephemeral storage for testing
//! - **FileStore**: JSON file-based persistence, human-inspectable
//! - **BinaryStore**: Compact binary format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use synthmint::storage::{InMemoryStore, StateManager};
//!
//! let manager = StateManager::new(InMemoryStore::new());
//! manager.initialize(&state)?;
//! let state = manager.load()?;
//! ```

pub mod backend;
pub mod state;

pub use backend::*;
pub use state::*;
