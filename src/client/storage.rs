//! Key/value persistence for client-local state.
//!
//! Session data and word lists are stored as string values under string keys.
//! [`FileStore`] keeps them in a single JSON object on disk and rewrites the
//! file on every change; [`MemoryStore`] is the in-process equivalent.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("State file {path} is not a JSON object of strings: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
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

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON-file backed store
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => {
                serde_json::from_str(&content).map_err(|source| StorageError::Format {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the whole map to a sibling temp file and rename it into place
    fn flush(&self) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content =
            serde_json::to_string_pretty(&self.entries).map_err(|source| StorageError::Format {
                path: self.path.clone(),
                source,
            })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.get("token").unwrap().is_none());

        store.set("token", "abc").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));

        store.remove("token").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("token", "abc").unwrap();
        store.set("user", r#"{"id":"u1"}"#).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(
            reopened.get("user").unwrap().as_deref(),
            Some(r#"{"id":"u1"}"#)
        );
    }

    #[test]
    fn test_file_store_remove_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set("token", "abc").unwrap();
        store.remove("token").unwrap();
        store.remove("never-set").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert!(reopened.get("token").unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StorageError::Format { .. })
        ));
    }

    #[test]
    fn test_store_through_mut_ref() {
        fn write<S: KeyValueStore>(mut store: S) {
            store.set("k", "v").unwrap();
        }

        let mut store = MemoryStore::new();
        write(&mut store);
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
