//! Persistent key-value storage used by the session and catalog layers.
//!
//! A [`KeyValueStorage`] backend plays the role of the browser's local storage: flat
//! string keys mapped to string values. Backends:
//! - [`MemoryStorage`]: in-process map, can be flipped to unavailable to emulate disabled
//!   storage or quota errors.
//! - [`FileStorage`]: a JSON document on disk, rewritten atomically on every mutation.
//!
//! [`Namespace`] layers a key prefix and value encoding on top of a backend so that the
//! legacy flat keys and the managed prefixed keys can share one backend.

use std::sync::Arc;

mod file;
mod memory;
mod namespace;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use namespace::{Namespace, NamespaceKind};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage value is not valid json: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Flat string-to-string persistence.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Returns true if the key existed.
    fn remove(&self, key: &str) -> StorageResult<bool>;
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Remove every key starting with `prefix`. Returns number of removed keys.
    fn remove_prefix(&self, prefix: &str) -> StorageResult<usize> {
        let mut n = 0;
        for k in self.keys()?.into_iter().filter(|k| k.starts_with(prefix)) {
            if self.remove(&k)? { n += 1; }
        }
        Ok(n)
    }
}

pub type SharedStorage = Arc<dyn KeyValueStorage>;

/// Checks a backend with a throwaway write, the way the client checks local storage.
pub fn is_available(storage: &dyn KeyValueStorage) -> bool {
    const CHECK_KEY: &str = "__test__";
    storage.set(CHECK_KEY, CHECK_KEY).and_then(|_| storage.remove(CHECK_KEY)).is_ok()
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
