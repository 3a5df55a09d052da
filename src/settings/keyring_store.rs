use keyring::credential::CredentialPersistence;
use keyring::Entry;

use super::{SettingsStore, StorageBackend, StoreError};
use crate::constants::KEYRING_SERVICE;

const CHECK_KEY: &str = "__check__";

/// Settings kept in the platform secure store, one entry per key.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE.to_string(),
        }
    }

    /// Check that the platform keyring keeps values on disk and returns them.
    pub fn is_usable() -> bool {
        let persistence = keyring::default::default_credential_builder().persistence();
        if !persists(&persistence) {
            tracing::debug!("Keyring persistence is not UntilDelete, not using it");
            return false;
        }
        Self::round_trip()
    }

    /// Write a value and read it back through a fresh entry, so a backend
    /// that keeps values per entry handle is rejected.
    fn round_trip() -> bool {
        let Ok(entry) = Entry::new(KEYRING_SERVICE, CHECK_KEY) else {
            return false;
        };
        if entry.set_password("__test__").is_err() {
            return false;
        }

        let readable = Entry::new(KEYRING_SERVICE, CHECK_KEY)
            .and_then(|e| e.get_password())
            .is_ok_and(|v| v == "__test__");

        let _ = entry.delete_credential();
        readable
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

/// Settings must survive restarts and reboots.
fn persists(persistence: &CredentialPersistence) -> bool {
    matches!(persistence, CredentialPersistence::UntilDelete)
}

impl SettingsStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?.set_password(value)?;
        tracing::debug!("Stored {} in keyring", key);
        Ok(())
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Keyring
    }
}
