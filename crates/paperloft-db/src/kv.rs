//! Embedded [`KeyValueStore`] backed by sled.

use std::path::Path;

use paperloft_core::{Error, KeyValueStore, Result};

/// Name of the sled tree holding paperloft's local keys.
const TREE_NAME: &str = "local";

/// Durable local storage in a sled database directory.
#[derive(Clone)]
pub struct SledKeyValueStore {
    tree: sled::Tree,
}

impl SledKeyValueStore {
    /// Open (or create) the store under `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path.as_ref()).map_err(storage_err)?;
        let tree = db.open_tree(TREE_NAME).map_err(storage_err)?;
        tracing::info!(
            subsystem = "db",
            component = "sled",
            path = %path.as_ref().display(),
            "Opened local store"
        );
        Ok(Self { tree })
    }
}

impl KeyValueStore for SledKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(bytes) = self.tree.get(key).map_err(storage_err)? else {
            return Ok(None);
        };
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| Error::Storage(format!("non UTF-8 value under {}: {}", key, e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.tree
            .insert(key, value.as_bytes())
            .map_err(storage_err)?;
        self.tree.flush().map_err(storage_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.tree.remove(key).map_err(storage_err)?;
        self.tree.flush().map_err(storage_err)?;
        Ok(())
    }
}

fn storage_err(e: sled::Error) -> Error {
    Error::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledKeyValueStore::open(dir.path()).unwrap();

        assert_eq!(store.get("researchBookmarks").unwrap(), None);
        store.set("researchBookmarks", "[]").unwrap();
        assert_eq!(store.get("researchBookmarks").unwrap().as_deref(), Some("[]"));

        store.remove("researchBookmarks").unwrap();
        assert_eq!(store.get("researchBookmarks").unwrap(), None);
        store.remove("never-set").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledKeyValueStore::open(dir.path()).unwrap();
            store.set("googleSettings", r#"{"apiKey":"k","cx":"c"}"#).unwrap();
        }
        let store = SledKeyValueStore::open(dir.path()).unwrap();
        assert_eq!(
            store.get("googleSettings").unwrap().as_deref(),
            Some(r#"{"apiKey":"k","cx":"c"}"#)
        );
    }
}
