use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{StorageError, StorageKey, TokenStorage};

const BACKEND_NAME: &str = "local";

/// Synchronous string-to-string storage persisted as a single JSON object.
///
/// Every call re-reads the file so separate processes sharing the path see
/// each other's writes. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: Option<PathBuf>,
}

impl LocalStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// A store with no backing file; every call fails with `Unavailable`.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn require_path(&self) -> Result<&Path, StorageError> {
        self.path().ok_or_else(|| StorageError::Unavailable {
            backend: BACKEND_NAME,
            reason: "storage is disabled".to_string(),
        })
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let path = self.require_path()?;
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let path = self.require_path()?;
        let unavailable = |e: std::io::Error| StorageError::Unavailable {
            backend: BACKEND_NAME,
            reason: format!("{}: {}", path.display(), e),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(unavailable)?;
        }
        let contents = serde_json::to_string_pretty(values)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        std::fs::write(path, contents).map_err(unavailable)?;
        Ok(())
    }
}

impl TokenStorage for LocalStorage {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn write(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let mut values = self.load()?;
        values.insert(key.as_str().to_string(), value.to_string());
        self.save(&values)?;
        debug!(backend = BACKEND_NAME, %key, "Stored value");
        Ok(())
    }

    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key.as_str()))
    }

    fn delete(&self, key: StorageKey) -> Result<(), StorageError> {
        let mut values = self.load()?;
        if values.remove(key.as_str()).is_some() {
            self.save(&values)?;
            debug!(backend = BACKEND_NAME, %key, "Removed value");
        }
        Ok(())
    }
}
