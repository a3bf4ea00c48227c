use serde_json::Value;
use vista_core::VistaResult;

use crate::keys::PreferenceKey;

/// Abstract storage for per-view preferences.
///
/// Implementations are synchronous: effective-value resolution happens
/// inline on every render pass. Callers treat any error as "no persisted
/// value" — storage must never block rendering.
pub trait PreferenceStore: Send {
    /// Read the stored value for a key, if any.
    fn get(&self, key: &PreferenceKey) -> VistaResult<Option<Value>>;

    /// Store a value for a key, replacing any previous one.
    fn set(&mut self, key: &PreferenceKey, value: Value) -> VistaResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &PreferenceKey) -> VistaResult<()>;
}
