//! Persistent key-value settings for API credentials
//!
//! Two backends implement [`SettingsStore`]:
//! - [`KeyringStore`]: the OS secure store (desktop mode)
//! - [`FileStore`]: a flat TOML file in the config directory (local mode)
//!
//! The backend is chosen once by [`open_store`]; everything else talks to the
//! typed [`Settings`] facade.

mod file;
mod keyring_store;
#[cfg(test)]
pub(crate) mod memory;

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::config::StoragePreference;
use crate::constants::{API_KEY_KEY, BASE_URL_KEY, DEFAULT_BASE_URL};

pub use file::FileStore;
pub use keyring_store::KeyringStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("OS keyring is unavailable on this system")]
    KeyringUnavailable,
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("Settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings file is malformed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The backend a store actually resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Keyring,
    File,
    #[cfg(test)]
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Keyring => write!(f, "OS keyring"),
            StorageBackend::File => write!(f, "settings file"),
            #[cfg(test)]
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// A string-to-string persistence boundary.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn backend(&self) -> StorageBackend;
}

/// Open the store selected by `preference`.
///
/// `Auto` tries the keyring first and demotes to the settings file under
/// `config_dir` for the rest of the process if the keyring cannot be used.
pub fn open_store(
    preference: StoragePreference,
    config_dir: &Path,
) -> Result<Box<dyn SettingsStore>, StoreError> {
    let keyring_ok = match preference {
        StoragePreference::File => false,
        StoragePreference::Keyring | StoragePreference::Auto => KeyringStore::is_usable(),
    };
    select_store(preference, keyring_ok, config_dir)
}

fn select_store(
    preference: StoragePreference,
    keyring_ok: bool,
    config_dir: &Path,
) -> Result<Box<dyn SettingsStore>, StoreError> {
    match (preference, keyring_ok) {
        (StoragePreference::File, _) => Ok(Box::new(file_store(config_dir))),
        (StoragePreference::Keyring, true) => Ok(Box::new(KeyringStore::new())),
        (StoragePreference::Keyring, false) => Err(StoreError::KeyringUnavailable),
        (StoragePreference::Auto, true) => {
            tracing::debug!("Using OS keyring for settings");
            Ok(Box::new(KeyringStore::new()))
        }
        (StoragePreference::Auto, false) => {
            let store = file_store(config_dir);
            tracing::warn!(
                "OS keyring unavailable, falling back to {}",
                store.path().display()
            );
            Ok(Box::new(store))
        }
    }
}

fn file_store(config_dir: &Path) -> FileStore {
    FileStore::new(config_dir.join("settings.toml"))
}

/// Typed access to the two credential settings.
pub struct Settings {
    store: Box<dyn SettingsStore>,
}

impl Settings {
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> StorageBackend {
        self.store.backend()
    }

    /// Stored API key; an empty value counts as unset.
    pub fn api_key(&self) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(API_KEY_KEY)?.filter(|k| !k.is_empty()))
    }

    pub fn set_api_key(&self, api_key: &str) -> Result<(), StoreError> {
        self.store.set(API_KEY_KEY, api_key)
    }

    /// Stored base URL, or the OpenRouter default.
    pub fn base_url(&self) -> Result<String, StoreError> {
        Ok(self
            .store
            .get(BASE_URL_KEY)?
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
    }

    pub fn set_base_url(&self, base_url: &str) -> Result<(), StoreError> {
        self.store.set(BASE_URL_KEY, base_url)
    }
}
