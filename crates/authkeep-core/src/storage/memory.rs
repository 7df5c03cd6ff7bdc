use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{StorageError, StorageKey, TokenStorage};

const BACKEND_NAME: &str = "memory";

/// In-process storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|values| values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<StorageKey, String>>, StorageError> {
        self.values.lock().map_err(|_| StorageError::Unavailable {
            backend: BACKEND_NAME,
            reason: "lock poisoned".to_string(),
        })
    }
}

impl TokenStorage for MemoryStorage {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn write(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.lock()?.insert(key, value.to_string());
        Ok(())
    }

    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(&key).cloned())
    }

    fn delete(&self, key: StorageKey) -> Result<(), StorageError> {
        self.lock()?.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_write_overwrites() {
        let storage = MemoryStorage::new();
        storage.write(StorageKey::AccessToken, "first").unwrap();
        storage.write(StorageKey::AccessToken, "second").unwrap();
        assert_eq!(storage.read(StorageKey::AccessToken).unwrap().as_deref(), Some("second"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_memory_keys_are_independent() {
        let storage = MemoryStorage::new();
        storage.write(StorageKey::AccessToken, "access").unwrap();
        storage.write(StorageKey::RefreshToken, "refresh").unwrap();
        storage.delete(StorageKey::AccessToken).unwrap();
        assert_eq!(storage.read(StorageKey::AccessToken).unwrap(), None);
        assert_eq!(storage.read(StorageKey::RefreshToken).unwrap().as_deref(), Some("refresh"));
    }

    #[test]
    fn test_memory_delete_missing_key() {
        let storage = MemoryStorage::new();
        assert!(storage.delete(StorageKey::Theme).is_ok());
        assert!(storage.is_empty());
    }
}
