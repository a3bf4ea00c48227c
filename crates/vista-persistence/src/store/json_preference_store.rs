use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use vista_core::{VistaError, VistaResult};

use crate::keys::PreferenceKey;
use crate::store::atomic_writer::AtomicWriter;
use crate::traits::PreferenceStore;

const FORMAT_VERSION: u32 = 1;

/// JSON file-backed preference store.
///
/// The whole file is read once on open and kept in memory; every mutation
/// writes the file back atomically. An unreadable or malformed file opens
/// as an empty store — a broken preference file must never block a render.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    instance_id: Uuid,
    entries: HashMap<String, Value>,
}

/// Wrapper structure for the preference file format
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferenceEnvelope {
    version: u32,
    instance_id: Uuid,
    saved_at: DateTime<Utc>,
    entries: HashMap<String, Value>,
}

impl JsonPreferenceStore {
    /// Open a store at `path`, loading existing entries when the file is
    /// readable and well-formed.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match Self::load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    "Could not load preferences from {}: {}. Starting empty.",
                    path.display(),
                    e
                );
                HashMap::new()
            }
        };
        Self {
            path,
            instance_id: Uuid::new_v4(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    fn load_entries(path: &Path) -> VistaResult<HashMap<String, Value>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = AtomicWriter::read_all(path)?;
        let envelope: PreferenceEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| VistaError::Serialization(e.to_string()))?;
        if envelope.version != FORMAT_VERSION {
            return Err(VistaError::Serialization(format!(
                "Unsupported preference format version: {}",
                envelope.version
            )));
        }
        Ok(envelope.entries)
    }

    fn flush(&self) -> VistaResult<()> {
        let envelope = PreferenceEnvelope {
            version: FORMAT_VERSION,
            instance_id: self.instance_id,
            saved_at: Utc::now(),
            entries: self.entries.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| VistaError::Serialization(e.to_string()))?;
        AtomicWriter::write_atomic(&self.path, &bytes)?;
        tracing::debug!(
            "Saved {} preference entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &PreferenceKey) -> VistaResult<Option<Value>> {
        Ok(self.entries.get(&key.storage_key()).cloned())
    }

    fn set(&mut self, key: &PreferenceKey, value: Value) -> VistaResult<()> {
        self.entries.insert(key.storage_key(), value);
        self.flush()
    }

    fn remove(&mut self, key: &PreferenceKey) -> VistaResult<()> {
        if self.entries.remove(&key.storage_key()).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::ViewAspect;
    use serde_json::json;
    use tempfile::tempdir;

    fn key(view: &str, aspect: ViewAspect) -> PreferenceKey {
        PreferenceKey::new("vista.views", view, aspect)
    }

    #[test]
    fn test_set_get_remove() {
        let dir = tempdir().unwrap();
        let mut store = JsonPreferenceStore::open(dir.path().join("prefs.json"));

        let k = key("view-1", ViewAspect::SortConfig);
        assert_eq!(store.get(&k).unwrap(), None);

        store
            .set(&k, json!({ "fieldId": "estimate", "direction": "DESC" }))
            .unwrap();
        assert_eq!(
            store.get(&k).unwrap(),
            Some(json!({ "fieldId": "estimate", "direction": "DESC" }))
        );

        store.remove(&k).unwrap();
        assert_eq!(store.get(&k).unwrap(), None);

        // Removing again is fine.
        store.remove(&k).unwrap();
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let k = key("view-1", ViewAspect::HiddenFields);
        {
            let mut store = JsonPreferenceStore::open(&path);
            store.set(&k, json!(["Status", "Estimate"])).unwrap();
        }

        let store = JsonPreferenceStore::open(&path);
        assert_eq!(store.get(&k).unwrap(), Some(json!(["Status", "Estimate"])));
    }

    #[test]
    fn test_corrupt_file_opens_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonPreferenceStore::open(&path);
        let k = key("view-1", ViewAspect::Slice);
        assert_eq!(store.get(&k).unwrap(), None);
    }

    #[test]
    fn test_unsupported_version_opens_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&json!({
                "version": 99,
                "instanceId": Uuid::new_v4(),
                "savedAt": Utc::now(),
                "entries": { "x": 1 }
            }))
            .unwrap(),
        )
        .unwrap();

        let store = JsonPreferenceStore::open(&path);
        assert!(store.entries.is_empty());
    }
}
