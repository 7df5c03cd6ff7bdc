//! Application configuration management.
//!
//! This module handles loading the configuration that selects the token
//! storage backend and its location. The backend is chosen once, when the
//! storage is built, and never per call.
//!
//! Configuration is stored at `~/.config/authkeep/config.json`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{secure::DEFAULT_SERVICE_NAME, LocalStorage, MemoryStorage, SecureStorage, TokenStorage};

/// Application name used for config/data directory paths
const APP_NAME: &str = "authkeep";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Local storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

/// Environment variable overriding the configured backend
pub const BACKEND_ENV_VAR: &str = "AUTHKEEP_BACKEND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Secure,
    Memory,
}

impl StorageBackend {
    /// Browser builds get the plain key-value store, everything else the keychain.
    pub fn for_platform() -> Self {
        if cfg!(target_arch = "wasm32") {
            StorageBackend::Local
        } else {
            StorageBackend::Secure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Local => "local",
            StorageBackend::Secure => "secure",
            StorageBackend::Memory => "memory",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "secure" => Ok(StorageBackend::Secure),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown storage backend '{}' (expected local, secure or memory)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend: Option<StorageBackend>,
    pub service_name: Option<String>,
    pub storage_path: Option<PathBuf>,
}

impl Config {
    /// Load from the default location, then apply `AUTHKEEP_BACKEND`.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)?.with_env_overrides()
    }

    /// Apply `AUTHKEEP_BACKEND` if it is set.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var(BACKEND_ENV_VAR) {
            self.backend = Some(
                value
                    .parse()
                    .with_context(|| format!("Invalid {}", BACKEND_ENV_VAR))?,
            );
        }
        Ok(self)
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn backend(&self) -> StorageBackend {
        self.backend.unwrap_or_else(StorageBackend::for_platform)
    }

    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.storage_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(STORAGE_FILE))
    }

    /// Build the configured storage backend.
    pub fn build_storage(&self) -> Result<Box<dyn TokenStorage>> {
        let backend = self.backend();
        debug!(%backend, "Selected token storage backend");
        let storage: Box<dyn TokenStorage> = match backend {
            StorageBackend::Local => Box::new(LocalStorage::new(self.storage_path()?)),
            StorageBackend::Secure => Box::new(SecureStorage::new(self.service_name())),
            StorageBackend::Memory => Box::new(MemoryStorage::new()),
        };
        Ok(storage)
    }
}
