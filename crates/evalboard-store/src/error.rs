//! Error types for evalboard-store

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Seed data collided with a key that is already present
    #[error("key already present: {key}")]
    DuplicateKey { key: String },
}
