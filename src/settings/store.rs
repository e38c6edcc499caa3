// Settings store implementations.
// Persists the option groups as key-value maps, either on disk or in memory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::cache::store;
use crate::error::{FeedError, Result};

use super::SettingsGroup;

/// Key-value persistence for option groups.
pub trait SettingsStore: Send + Sync {
    /// Stored values for a group, `None` if the group was never saved.
    fn get_settings(&self, group: SettingsGroup) -> Result<Option<Map<String, Value>>>;

    /// Replace a group's stored values.
    fn set_settings(&self, group: SettingsGroup, values: Map<String, Value>) -> Result<()>;

    /// Remove a group entirely.
    fn delete_settings(&self, group: SettingsGroup) -> Result<()>;

    /// A single stored value, or `default` when the group or key is missing.
    fn get_setting(&self, name: &str, group: SettingsGroup, default: Value) -> Result<Value> {
        Ok(self
            .get_settings(group)?
            .and_then(|mut values| values.remove(name))
            .unwrap_or(default))
    }
}

/// Settings kept in a JSON file: `{"general": {...}, "advanced": {...}}`.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        Ok(store::read_json(&self.path)?.unwrap_or_default())
    }

    fn update(&self, f: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| FeedError::Settings("settings lock poisoned".to_string()))?;
        let mut all = self.read_all()?;
        f(&mut all);
        store::write_json(&self.path, &all)
    }
}

impl SettingsStore for FileSettingsStore {
    fn get_settings(&self, group: SettingsGroup) -> Result<Option<Map<String, Value>>> {
        match self.read_all()?.remove(group.name()) {
            Some(Value::Object(values)) => Ok(Some(values)),
            Some(_) | None => Ok(None),
        }
    }

    fn set_settings(&self, group: SettingsGroup, values: Map<String, Value>) -> Result<()> {
        self.update(|all| {
            all.insert(group.name().to_string(), Value::Object(values));
        })
    }

    fn delete_settings(&self, group: SettingsGroup) -> Result<()> {
        if !store::exists(&self.path) {
            return Ok(());
        }
        self.update(|all| {
            all.remove(group.name());
        })
    }
}

/// Settings held in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    groups: Mutex<HashMap<SettingsGroup, Map<String, Value>>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn groups(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SettingsGroup, Map<String, Value>>>> {
        self.groups
            .lock()
            .map_err(|_| FeedError::Settings("settings lock poisoned".to_string()))
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_settings(&self, group: SettingsGroup) -> Result<Option<Map<String, Value>>> {
        Ok(self.groups()?.get(&group).cloned())
    }

    fn set_settings(&self, group: SettingsGroup, values: Map<String, Value>) -> Result<()> {
        self.groups()?.insert(group, values);
        Ok(())
    }

    fn delete_settings(&self, group: SettingsGroup) -> Result<()> {
        self.groups()?.remove(&group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn values(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn exercise(store: &dyn SettingsStore) {
        assert!(store.get_settings(SettingsGroup::General).unwrap().is_none());
        assert_eq!(
            store
                .get_setting("feed_url", SettingsGroup::General, json!("fallback"))
                .unwrap(),
            json!("fallback")
        );

        store
            .set_settings(
                SettingsGroup::General,
                values(json!({"feed_url": "https://example.com/feed"})),
            )
            .unwrap();
        store
            .set_settings(SettingsGroup::Advanced, values(json!({"date_format": "Y-m-d"})))
            .unwrap();

        assert_eq!(
            store
                .get_setting("feed_url", SettingsGroup::General, Value::Null)
                .unwrap(),
            json!("https://example.com/feed")
        );
        // Groups are independent
        assert_eq!(
            store
                .get_setting("feed_url", SettingsGroup::Advanced, Value::Null)
                .unwrap(),
            Value::Null
        );

        store.delete_settings(SettingsGroup::General).unwrap();
        assert!(store.get_settings(SettingsGroup::General).unwrap().is_none());
        assert!(store.get_settings(SettingsGroup::Advanced).unwrap().is_some());
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemorySettingsStore::new());
    }

    #[test]
    fn test_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("options.json");
        exercise(&FileSettingsStore::new(&path));

        // Survives reopening
        let reopened = FileSettingsStore::new(&path);
        assert_eq!(
            reopened
                .get_setting("date_format", SettingsGroup::Advanced, Value::Null)
                .unwrap(),
            json!("Y-m-d")
        );
    }

    #[test]
    fn test_file_store_delete_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("options.json");
        let store = FileSettingsStore::new(&path);

        store.delete_settings(SettingsGroup::General).unwrap();
        assert!(!path.exists());
    }
}
