//! Protocol module - Engine orchestration and events.
//!
//! This module provides the engine that executes all operations
//! atomically against persisted state, and the event types it journals.

pub mod engine;
pub mod events;

pub use engine::*;
pub use events::*;
