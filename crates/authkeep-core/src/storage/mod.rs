//! Token storage backends.
//!
//! This module provides the `TokenStorage` capability with three implementations:
//! - `LocalStorage`: synchronous string-to-string store kept in a JSON file
//! - `SecureStorage`: OS-level credential storage via keyring
//! - `MemoryStorage`: in-process map with no persistence
//!
//! Every backend stores the raw token string under the same key names.

pub mod local;
pub mod memory;
pub mod secure;

use std::fmt;

use thiserror::Error;

pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use secure::SecureStorage;

/// Keys shared by every storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    ActiveBaseUrl,
    OriginalBaseUrl,
    Theme,
}

impl StorageKey {
    pub const ALL: [StorageKey; 5] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::ActiveBaseUrl,
        StorageKey::OriginalBaseUrl,
        StorageKey::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "react__access_token",
            StorageKey::RefreshToken => "react__refresh_token",
            StorageKey::ActiveBaseUrl => "react__active_baseUrl",
            StorageKey::OriginalBaseUrl => "react__original_baseUrl",
            StorageKey::Theme => "react__theme_preference",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{backend} storage is unavailable: {reason}")]
    Unavailable { backend: &'static str, reason: String },

    #[error("{backend} storage does not support reading")]
    Unsupported { backend: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Stored data is corrupt: {0}")]
    Corrupt(String),
}

/// A key-value store for tokens and related client settings.
///
/// Values are plain strings. `write` overwrites, `delete` of a missing key succeeds.
pub trait TokenStorage: Send + Sync {
    /// Short backend name used in logs and errors
    fn name(&self) -> &'static str;

    fn write(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;

    /// Backends that cannot read back what they wrote keep this default.
    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let _ = key;
        Err(StorageError::Unsupported { backend: self.name() })
    }

    fn delete(&self, key: StorageKey) -> Result<(), StorageError>;
}

impl TokenStorage for Box<dyn TokenStorage> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn write(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        (**self).write(key, value)
    }

    fn read(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn delete(&self, key: StorageKey) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}
