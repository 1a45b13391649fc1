//! Typed access to locally persisted state.
//!
//! Everything lives in a [`KeyValueStore`] as JSON under four fixed keys.
//! Unreadable provider settings are logged and treated as empty. Unreadable
//! bookmark or project lists are an error, so no read-modify-write can
//! overwrite entries it failed to parse.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{Bookmark, GoogleSettings, OpenAISettings, Project};
use crate::traits::KeyValueStore;

/// Saved bookmarks (JSON array).
pub const BOOKMARKS_KEY: &str = "researchBookmarks";
/// Projects (JSON array).
pub const PROJECTS_KEY: &str = "researchProjects";
/// Google Custom Search credentials.
pub const GOOGLE_SETTINGS_KEY: &str = "googleSettings";
/// OpenAI chat settings.
pub const OPENAI_SETTINGS_KEY: &str = "openaiSettings";

/// Typed wrapper around the key-value store.
#[derive(Clone)]
pub struct LocalStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Store backed by process memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::default()))
    }

    pub fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        self.read_list(BOOKMARKS_KEY)
    }

    pub fn save_bookmarks(&self, bookmarks: &[Bookmark]) -> Result<()> {
        self.write(BOOKMARKS_KEY, &bookmarks)
    }

    pub fn projects(&self) -> Result<Vec<Project>> {
        self.read_list(PROJECTS_KEY)
    }

    pub fn save_projects(&self, projects: &[Project]) -> Result<()> {
        self.write(PROJECTS_KEY, &projects)
    }

    pub fn google_settings(&self) -> Result<GoogleSettings> {
        self.read_or_default(GOOGLE_SETTINGS_KEY)
    }

    /// Save Google credentials, trimming surrounding whitespace.
    pub fn save_google_settings(&self, settings: &GoogleSettings) -> Result<()> {
        let trimmed = GoogleSettings {
            api_key: settings.api_key.trim().to_string(),
            cx: settings.cx.trim().to_string(),
        };
        self.write(GOOGLE_SETTINGS_KEY, &trimmed)
    }

    pub fn openai_settings(&self) -> Result<OpenAISettings> {
        self.read_or_default(OPENAI_SETTINGS_KEY)
    }

    pub fn save_openai_settings(&self, settings: &OpenAISettings) -> Result<()> {
        let mut settings = settings.clone();
        settings.api_key = settings.api_key.trim().to_string();
        self.write(OPENAI_SETTINGS_KEY, &settings)
    }

    /// Remove bookmarks and projects. Provider settings are kept.
    pub fn clear_library(&self) -> Result<()> {
        self.kv.remove(BOOKMARKS_KEY)?;
        self.kv.remove(PROJECTS_KEY)?;
        tracing::info!(subsystem = "core", component = "local_store", "Local data cleared");
        Ok(())
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(
                subsystem = "core",
                component = "local_store",
                key,
                error = %e,
                "Unreadable local list"
            );
            Error::Serialization(format!("{}: {}", key, e))
        })
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(
                    subsystem = "core",
                    component = "local_store",
                    key,
                    error = %e,
                    "Unreadable local value, using default"
                );
                Ok(T::default())
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.kv.set(key, &raw)
    }
}

/// In-memory [`KeyValueStore`], used for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_default_to_empty() {
        let store = LocalStore::in_memory();
        assert!(store.bookmarks().unwrap().is_empty());
        assert!(store.projects().unwrap().is_empty());
        assert!(!store.google_settings().unwrap().is_configured());
        assert!(!store.openai_settings().unwrap().is_configured());
    }

    #[test]
    fn test_corrupted_settings_default() {
        let kv = Arc::new(MemoryKeyValueStore::default());
        kv.set(GOOGLE_SETTINGS_KEY, "{not json").unwrap();
        let store = LocalStore::new(kv);
        assert!(!store.google_settings().unwrap().is_configured());
    }

    #[test]
    fn test_corrupted_list_is_an_error() {
        let kv = Arc::new(MemoryKeyValueStore::default());
        kv.set(BOOKMARKS_KEY, "{not json").unwrap();
        kv.set(PROJECTS_KEY, r#"[{"id": 7}]"#).unwrap();
        let store = LocalStore::new(kv.clone());

        assert!(matches!(store.bookmarks(), Err(Error::Serialization(_))));
        assert!(matches!(store.projects(), Err(Error::Serialization(_))));
        assert_eq!(kv.get(BOOKMARKS_KEY).unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_google_settings_trimmed() {
        let store = LocalStore::in_memory();
        store
            .save_google_settings(&GoogleSettings {
                api_key: "  key ".to_string(),
                cx: "\tcx\n".to_string(),
            })
            .unwrap();
        let loaded = store.google_settings().unwrap();
        assert_eq!(loaded.api_key, "key");
        assert_eq!(loaded.cx, "cx");
        assert!(loaded.is_configured());
    }

    #[test]
    fn test_clear_library_keeps_settings() {
        let store = LocalStore::in_memory();
        store
            .save_projects(&[Project {
                id: "p1".to_string(),
                name: "P".to_string(),
                description: String::new(),
                created_at: 0,
                paper_ids: vec![],
                gpt_instruction: String::new(),
            }])
            .unwrap();
        store
            .save_openai_settings(&OpenAISettings {
                api_key: "sk".to_string(),
                ..Default::default()
            })
            .unwrap();

        store.clear_library().unwrap();

        assert!(store.projects().unwrap().is_empty());
        assert_eq!(store.openai_settings().unwrap().api_key, "sk");
    }
}
