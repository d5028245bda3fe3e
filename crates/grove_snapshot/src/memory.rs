use grove_core::StoreError;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use crate::store::{normalize_rel_path, FileStore};

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<String, String>>,
    unreadable: BTreeSet<String>,
    read_only: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new<P, T>(files: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: AsRef<str>,
        T: Into<String>,
    {
        Self {
            files: RwLock::new(
                files
                    .into_iter()
                    .map(|(p, t)| (normalize_rel_path(p.as_ref()), t.into()))
                    .collect(),
            ),
            unreadable: BTreeSet::new(),
            read_only: BTreeSet::new(),
        }
    }

    /// Make `read` of `path` fail while it still shows up in listings.
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(normalize_rel_path(path));
        self
    }

    /// Make `write` and `remove` of `path` fail.
    pub fn with_read_only(mut self, path: &str) -> Self {
        self.read_only.insert(normalize_rel_path(path));
        self
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(&normalize_rel_path(path)).cloned())
    }

    fn poisoned(&self) -> StoreError {
        StoreError::Unavailable {
            root: self.describe(),
            message: "store lock poisoned".to_string(),
        }
    }
}

impl FileStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn list_documents(&self) -> Result<Vec<String>, StoreError> {
        let files = self.files.read().map_err(|_| self.poisoned())?;
        Ok(files.keys().cloned().collect())
    }

    fn read(&self, path: &str) -> Result<String, StoreError> {
        let path = normalize_rel_path(path);
        if self.unreadable.contains(&path) {
            return Err(StoreError::Read {
                path,
                message: "permission denied".to_string(),
            });
        }
        let files = self.files.read().map_err(|_| self.poisoned())?;
        files.get(&path).cloned().ok_or(StoreError::NotFound(path))
    }

    fn write(&self, path: &str, text: &str) -> Result<(), StoreError> {
        let path = normalize_rel_path(path);
        if self.read_only.contains(&path) {
            return Err(StoreError::Write {
                path,
                message: "read-only file".to_string(),
            });
        }
        let mut files = self.files.write().map_err(|_| self.poisoned())?;
        files.insert(path, text.to_string());
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        let path = normalize_rel_path(path);
        if self.read_only.contains(&path) {
            return Err(StoreError::Remove {
                path,
                message: "read-only file".to_string(),
            });
        }
        let mut files = self.files.write().map_err(|_| self.poisoned())?;
        files
            .remove(&path)
            .map(|_| ())
            .ok_or(StoreError::NotFound(path))
    }
}
