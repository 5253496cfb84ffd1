//! Generic keyed store shared by every pipeline stage.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::StorageError;
use crate::StorageResult;

/// A value that carries its own storage key.
///
/// Reference data (benchmarks, users) and projections keyed by their own id
/// implement this so they can be seeded without spelling the key twice.
pub trait Record {
    /// The key this value is stored under.
    fn record_key(&self) -> String;
}

/// Concurrency-safe keyed container.
///
/// Guarantees:
/// - `save(k, v2)` after `save(k, v1)` leaves exactly one entry for `k`, equal to `v2`.
/// - `list()` is a snapshot ordered by key; later writes never show through it.
/// - Each call is atomic with respect to every other call on the same store.
#[derive(Debug)]
pub struct Store<T> {
    entries: RwLock<BTreeMap<String, T>>,
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T: Clone> Store<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the value stored under `key`.
    pub fn save(&self, key: impl Into<String>, value: T) {
        self.entries.write().insert(key.into(), value);
    }

    /// Clone of the value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries.read().get(key).cloned()
    }

    /// Snapshot of every stored value, ordered by key.
    pub fn list(&self) -> Vec<T> {
        self.entries.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T: Clone + Record> Store<T> {
    /// Preload reference data before traffic begins.
    ///
    /// Unlike `save`, seeding never overwrites: a key that is already present
    /// is reported as [`StorageError::DuplicateKey`].
    pub fn seed(&self, value: T) -> StorageResult<()> {
        let key = value.record_key();
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(StorageError::DuplicateKey { key });
        }
        entries.insert(key, value);
        Ok(())
    }
}
