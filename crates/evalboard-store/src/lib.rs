//! evalboard-store: in-memory persistence for evalboard stages
//!
//! Every pipeline stage owns one or more [`Store`] instances. A store is a
//! keyed container guarded by a single reader/writer lock:
//!
//! - `save` upserts by key, a later write for the same key replaces the value
//! - `list` returns a snapshot copy that never aliases internal state
//! - `get` returns a clone of the current value for a key
//! - `seed` preloads reference data keyed by [`Record::record_key`]
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: per-call atomicity. There is no cross-key or cross-call
//! transaction; stages that need one add their own lock on top.

mod error;
mod store;

pub use error::StorageError;
pub use store::{Record, Store};

/// Result type for store operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;
