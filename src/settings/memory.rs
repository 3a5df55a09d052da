use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{SettingsStore, StorageBackend, StoreError};

/// In-memory store that counts reads, for tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    reads: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn with(values: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (key, value) in values {
            store
                .values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
        store
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
