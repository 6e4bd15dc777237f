//! Local key-value storage for the credential token.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::RwLock,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token store io failure at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("token store at {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("token store lock poisoned")]
    Poisoned,
}

/// String key-value storage, shaped like browser local storage.
pub trait TokenStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, TokenStoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), TokenStoreError>;
    fn remove_item(&self, key: &str) -> Result<(), TokenStoreError>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::default();
        if let Ok(mut items) = store.items.write() {
            items.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        let items = self.items.read().map_err(|_| TokenStoreError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        let mut items = self.items.write().map_err(|_| TokenStoreError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), TokenStoreError> {
        let mut items = self.items.write().map_err(|_| TokenStoreError::Poisoned)?;
        items.remove(key);
        Ok(())
    }
}

/// A JSON object on disk. A missing file reads as empty.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, TokenStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(TokenStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<(), TokenStoreError> {
        let io_err = |source: io::Error| TokenStoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(items).map_err(|source| TokenStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, raw).map_err(io_err)
    }
}

impl TokenStore for FileTokenStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, TokenStoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), TokenStoreError> {
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), TokenStoreError> {
        let mut items = self.load()?;
        if items.remove(key).is_some() {
            self.save(&items)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.get_item("k").expect("get"), None);
        store.set_item("k", "v").expect("set");
        assert_eq!(store.get_item("k").expect("get").as_deref(), Some("v"));
        store.remove_item("k").expect("remove");
        assert_eq!(store.get_item("k").expect("get"), None);
    }

    #[test]
    fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get_item("access_token").expect("get"), None);
        store.remove_item("access_token").expect("remove on empty");
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("storage.json");
        FileTokenStore::new(&path)
            .set_item("access_token", "a.b.c")
            .expect("set");

        let reopened = FileTokenStore::new(&path);
        assert_eq!(
            reopened.get_item("access_token").expect("get").as_deref(),
            Some("a.b.c")
        );
        reopened.remove_item("access_token").expect("remove");
        assert_eq!(FileTokenStore::new(&path).get_item("access_token").expect("get"), None);
    }

    #[test]
    fn file_store_reports_corrupt_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1,2,3]").expect("write");
        let err = FileTokenStore::new(&path)
            .get_item("access_token")
            .expect_err("corrupt");
        assert!(matches!(err, TokenStoreError::Corrupt { .. }));
    }
}
