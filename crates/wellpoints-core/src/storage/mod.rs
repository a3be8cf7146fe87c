//! Secure key-value storage for session secrets.
//!
//! This module provides:
//! - `SecureStore`: the get/set/delete contract the session persists through
//! - `KeyringStore`: OS keychain backed storage via keyring
//! - `MemoryStore`: process-local storage for tests and ephemeral sessions

pub mod keychain;
pub mod memory;

use thiserror::Error;

pub use keychain::KeyringStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Secure storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read {key} from secure storage: {reason}")]
    Read { key: String, reason: String },

    #[error("Failed to write {key} to secure storage: {reason}")]
    Write { key: String, reason: String },

    #[error("Failed to delete {key} from secure storage: {reason}")]
    Delete { key: String, reason: String },
}

/// Key-value store with confidentiality guarantees.
///
/// Missing keys are `Ok(None)` on read and a no-op on delete.
pub trait SecureStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;
}
