use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use super::{KeyValueStorage, StorageResult};

/// Storage backend persisted as a single JSON object on disk.
///
/// The whole document is cached in memory and rewritten (tmp file + rename) after every
/// mutation, so a crash leaves either the old or the new document behind.
#[derive(Clone)]
pub struct FileStorage {
    path: PathBuf,
    map: Arc<parking_lot::Mutex<BTreeMap<String, String>>>,
}

impl FileStorage {
    /// Open (or lazily create) the document at `path`. A corrupt document is renamed
    /// with a `.corrupt` extension and storage starts empty.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() { if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; } }
        let map = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(m) => m,
                Err(e) => {
                    warn!(target: "storage", path = %path.display(), error = %e, "storage document is corrupt, starting empty");
                    let _ = std::fs::rename(&path, path.with_extension("corrupt"));
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, map: Arc::new(parking_lot::Mutex::new(map)) })
    }

    pub fn path(&self) -> &Path { &self.path }

    fn flush(&self, map: &BTreeMap<String, String>) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut g = self.map.lock();
        let prev = g.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&g) {
            // keep memory and disk in agreement
            match prev { Some(p) => { g.insert(key.to_string(), p); } None => { g.remove(key); } }
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut g = self.map.lock();
        let Some(prev) = g.remove(key) else { return Ok(false); };
        if let Err(e) = self.flush(&g) {
            g.insert(key.to_string(), prev);
            return Err(e);
        }
        Ok(true)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.map.lock().keys().cloned().collect())
    }

    fn remove_prefix(&self, prefix: &str) -> StorageResult<usize> {
        let mut g = self.map.lock();
        let before = g.clone();
        g.retain(|k, _| !k.starts_with(prefix));
        let n = before.len() - g.len();
        if n == 0 { return Ok(0); }
        if let Err(e) = self.flush(&g) {
            *g = before;
            return Err(e);
        }
        Ok(n)
    }
}
