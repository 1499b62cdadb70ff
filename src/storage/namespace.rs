use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::{SharedStorage, StorageResult};

const BACKUP_KEY: &str = "backup";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceKind {
    /// Flat keys, raw string values.
    Legacy,
    /// Prefixed keys, JSON-encoded values (strings are stored quoted).
    Managed { prefix: String },
}

/// A view over a storage backend restricted to one key scheme.
#[derive(Clone)]
pub struct Namespace {
    storage: SharedStorage,
    kind: NamespaceKind,
}

impl Namespace {
    pub fn legacy(storage: SharedStorage) -> Self { Self { storage, kind: NamespaceKind::Legacy } }

    pub fn managed(storage: SharedStorage, prefix: impl Into<String>) -> Self {
        Self { storage, kind: NamespaceKind::Managed { prefix: prefix.into() } }
    }

    pub fn kind(&self) -> &NamespaceKind { &self.kind }

    pub fn label(&self) -> &'static str {
        match self.kind { NamespaceKind::Legacy => "legacy", NamespaceKind::Managed { .. } => "managed" }
    }

    /// Physical key for a logical key.
    pub fn key(&self, key: &str) -> String {
        match &self.kind {
            NamespaceKind::Legacy => key.to_string(),
            NamespaceKind::Managed { prefix } => format!("{}{}", prefix, key),
        }
    }

    pub fn get_raw(&self, key: &str) -> StorageResult<Option<String>> { self.storage.get(&self.key(key)) }

    /// Read a string value. Managed values are unquoted; a managed value that is JSON but
    /// not a string is returned as its JSON text.
    pub fn get_str(&self, key: &str) -> StorageResult<Option<String>> {
        let Some(raw) = self.get_raw(key)? else { return Ok(None); };
        match self.kind {
            NamespaceKind::Legacy => Ok(Some(raw)),
            NamespaceKind::Managed { .. } => match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(serde_json::Value::String(s)) => Ok(Some(s)),
                Ok(_) => Ok(Some(raw)),
                Err(e) => Err(e.into()),
            },
        }
    }

    pub fn set_str(&self, key: &str, value: &str) -> StorageResult<()> {
        match self.kind {
            NamespaceKind::Legacy => self.storage.set(&self.key(key), value),
            NamespaceKind::Managed { .. } => self.storage.set(&self.key(key), &serde_json::to_string(value)?),
        }
    }

    /// Read and decode a JSON value. Both namespaces store structured values as JSON text.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(raw) = self.get_raw(key)? else { return Ok(None); };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.storage.set(&self.key(key), &serde_json::to_string(value)?)
    }

    pub fn remove(&self, key: &str) -> StorageResult<bool> { self.storage.remove(&self.key(key)) }

    /// Remove several logical keys; stops at the first backend failure.
    pub fn remove_all(&self, keys: &[&str]) -> StorageResult<usize> {
        let mut n = 0;
        for k in keys { if self.remove(k)? { n += 1; } }
        Ok(n)
    }

    /// Remove every key owned by this namespace. The legacy namespace has no prefix and
    /// cannot tell its keys apart from others, so only managed namespaces clear.
    pub fn clear(&self) -> StorageResult<usize> {
        match &self.kind {
            NamespaceKind::Legacy => Ok(0),
            NamespaceKind::Managed { prefix } => self.storage.remove_prefix(prefix),
        }
    }

    /// Snapshot every prefixed key except the logical keys in `skip` into
    /// `<prefix>backup`. Returns number of keys saved.
    pub fn backup(&self, skip: &[&str]) -> StorageResult<usize> {
        let NamespaceKind::Managed { prefix } = &self.kind else { return Ok(0); };
        let backup_key = self.key(BACKUP_KEY);
        let skipped: Vec<String> = skip.iter().map(|k| self.key(k)).collect();
        let mut snapshot: BTreeMap<String, String> = BTreeMap::new();
        for k in self.storage.keys()?.into_iter()
            .filter(|k| k.starts_with(prefix.as_str()) && *k != backup_key && !skipped.contains(k))
        {
            if let Some(v) = self.storage.get(&k)? { snapshot.insert(k, v); }
        }
        let n = snapshot.len();
        self.storage.set(&backup_key, &serde_json::to_string(&snapshot)?)?;
        debug!(target: "storage", keys = n, "managed namespace backed up");
        Ok(n)
    }

    /// Write back a snapshot taken by [`Namespace::backup`]. Returns false when no backup exists.
    pub fn restore_backup(&self) -> StorageResult<bool> {
        let Some(raw) = self.get_raw(BACKUP_KEY)? else { return Ok(false); };
        let snapshot: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        for (k, v) in snapshot.iter() { self.storage.set(k, v)?; }
        info!(target: "storage", keys = snapshot.len(), "managed namespace restored from backup");
        Ok(true)
    }

    /// Move flat keys into this namespace, JSON-encoding string values on the way.
    /// Returns the logical keys that were moved.
    pub fn migrate_legacy_keys(&self, keys: &[&str]) -> StorageResult<Vec<String>> {
        if self.kind == NamespaceKind::Legacy { return Ok(Vec::new()); }
        let mut moved = Vec::new();
        for k in keys {
            let Some(v) = self.storage.get(k)? else { continue; };
            if v.is_empty() { continue; }
            // structured values are already JSON; plain strings need quoting
            let encoded = match serde_json::from_str::<serde_json::Value>(&v) {
                Ok(serde_json::Value::Object(_)) | Ok(serde_json::Value::Array(_)) => v.clone(),
                _ => serde_json::to_string(&v)?,
            };
            self.storage.set(&self.key(k), &encoded)?;
            self.storage.remove(k)?;
            moved.push(k.to_string());
        }
        if !moved.is_empty() { info!(target: "storage", keys = ?moved, "migrated legacy keys into managed namespace"); }
        Ok(moved)
    }
}
