use serde_json::Value;
use std::collections::HashMap;
use vista_core::VistaResult;

use crate::keys::PreferenceKey;
use crate::traits::PreferenceStore;

/// In-memory preference store for tests and hosts without disk access.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: HashMap<String, Value>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &PreferenceKey) -> VistaResult<Option<Value>> {
        Ok(self.entries.get(&key.storage_key()).cloned())
    }

    fn set(&mut self, key: &PreferenceKey, value: Value) -> VistaResult<()> {
        self.entries.insert(key.storage_key(), value);
        Ok(())
    }

    fn remove(&mut self, key: &PreferenceKey) -> VistaResult<()> {
        self.entries.remove(&key.storage_key());
        Ok(())
    }
}
