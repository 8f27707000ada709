//! Durable client-side storage seam. Models the portal shell's key/value
//! store (browser localStorage, or a profile file for the desktop shell); the
//! engine only ever touches it through `ClientStorage`. The precondition
//! cache is deliberately NOT persisted here - a reload starts cold.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::GateError;

/// Fixed key the persisted identity record lives under. Kept in its own
/// namespace, apart from anything else the shell stores.
pub const IDENTITY_KEY: &str = "caregate.identity";

pub trait ClientStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), GateError>;
    fn remove(&self, key: &str);
}

/// Ephemeral storage for tests and shells without a durable store.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> { self.inner.lock().get(key).cloned() }

    fn set(&self, key: &str, value: &str) -> Result<(), GateError> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) { self.inner.lock().remove(key); }
}

/// Single JSON map file, rewritten wholesale on every mutation. An unreadable
/// or corrupt file is treated as empty rather than fatal - losing a cached
/// identity only costs the visitor a sign-in.
pub struct FileStorage {
    path: PathBuf,
    inner: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(m) => m,
                Err(e) => {
                    warn!(target: "caregate::storage", "corrupt store at '{}', starting empty: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, inner: Mutex::new(map) }
    }

    fn flush(&self, map: &HashMap<String, String>) -> Result<(), GateError> {
        let raw = serde_json::to_string_pretty(map).map_err(|e| GateError::Storage(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| GateError::Storage(e.to_string()))
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> { self.inner.lock().get(key).cloned() }

    fn set(&self, key: &str, value: &str) -> Result<(), GateError> {
        let mut map = self.inner.lock();
        map.insert(key.to_string(), value.to_string());
        self.flush(&map)
    }

    fn remove(&self, key: &str) {
        let mut map = self.inner.lock();
        if map.remove(key).is_some() {
            if let Err(e) = self.flush(&map) {
                warn!(target: "caregate::storage", "remove('{}') flush failed: {}", key, e);
            }
        }
    }
}
