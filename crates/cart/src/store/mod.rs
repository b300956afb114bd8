//! Key-value persistence for the anonymous cart.
//!
//! # Architecture
//!
//! - [`KeyValueStore`] is the seam to whatever the host offers (browser
//!   storage, a file, a map). It only moves strings.
//! - [`LocalCartStore`] owns the one namespaced key the cart lives under and
//!   handles (de)serialization and self-healing of corrupt payloads.

mod file;
mod local;
mod memory;

pub use file::FileStore;
pub use local::LocalCartStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key contains characters the store cannot represent.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Serializing the cart failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A string key-value store.
///
/// `delete` must be idempotent: deleting an absent key is not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value under `key`.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Whether `key` is usable by every store implementation.
///
/// Keys double as file names for [`FileStore`], so only letters, digits,
/// `_`, `-` and `.` are allowed, and dot-only names are rejected.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.chars().all(|c| c == '.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("cardfactory_cart"));
        assert!(is_valid_key("a.b-c_d"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key(".."));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key("cart key"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::InvalidKey("a/b".to_string());
        assert_eq!(err.to_string(), "Invalid storage key: a/b");
    }
}
