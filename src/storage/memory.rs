use std::collections::HashMap as StdHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{KeyValueStorage, StorageError, StorageResult};

/// In-process storage backend.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    map: Arc<parking_lot::RwLock<StdHashMap<String, String>>>,
    /// When set, every operation fails with `StorageError::Unavailable`
    unavailable: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    /// Toggle simulated unavailability (storage disabled, quota exceeded).
    pub fn set_available(&self, available: bool) { self.unavailable.store(!available, Ordering::SeqCst); }

    pub fn len(&self) -> usize { self.map.read().len() }

    pub fn is_empty(&self) -> bool { self.map.read().is_empty() }

    fn check(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) { return Err(StorageError::Unavailable("memory storage disabled".into())); }
        Ok(())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check()?;
        Ok(self.map.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check()?;
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        self.check()?;
        Ok(self.map.write().remove(key).is_some())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        self.check()?;
        let mut keys: Vec<String> = self.map.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn remove_prefix(&self, prefix: &str) -> StorageResult<usize> {
        self.check()?;
        let mut w = self.map.write();
        let to_remove: Vec<String> = w.keys().filter(|k| k.starts_with(prefix)).cloned().collect();
        let n = to_remove.len();
        for k in to_remove { w.remove(&k); }
        Ok(n)
    }
}
