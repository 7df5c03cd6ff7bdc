use keyring::Entry;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use super::{StorageError, StorageKey, TokenStorage};

const BACKEND_NAME: &str = "secure";

/// Default keychain service name
pub const DEFAULT_SERVICE_NAME: &str = "authkeep";

/// Storage in the OS keychain, one entry per key under a service name.
///
/// Inside a tokio runtime, writes and deletes are handed to the blocking pool
/// and not awaited: the call returns before the keychain is updated, and a
/// failure is only logged. Outside a runtime they run inline.
#[derive(Debug, Clone)]
pub struct SecureStorage {
    service: String,
}

impl SecureStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: StorageKey) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, key.as_str())?)
    }

    fn dispatch<F>(&self, key: StorageKey, action: &'static str, op: F) -> Result<(), StorageError>
    where
        F: FnOnce() -> keyring::Result<()> + Send + 'static,
    {
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || match op() {
                    Ok(()) => debug!(backend = BACKEND_NAME, %key, action, "Keychain updated"),
                    Err(e) => warn!(backend = BACKEND_NAME, %key, action, error = %e, "Keychain update failed"),
                });
                Ok(())
            }
            Err(_) => op().map_err(StorageError::from),
        }
    }
}

impl TokenStorage for SecureStorage {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn write(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let entry = self.entry(key)?;
        let value = value.to_string();
        self.dispatch(key, "write", move || entry.set_password(&value))
    }

    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: StorageKey) -> Result<(), StorageError> {
        let entry = self.entry(key)?;
        self.dispatch(key, "delete", move || match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        })
    }
}
