use grove_core::StoreError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::store::{normalize_rel_path, FileStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawFile {
    pub path: String,
    pub text: String,
    pub sha256: String,
}

/// A listed document whose content could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadFailure {
    pub path: String,
    pub message: String,
}

/// Raw text of every vault document, captured once and never mutated.
///
/// Files are sorted by path, so everything derived from a snapshot is
/// independent of the store's listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSnapshot {
    files: Vec<RawFile>,
    failures: Vec<ReadFailure>,
    sha256: String,
}

impl RawSnapshot {
    /// Read every listed document. Only a failure to list aborts; unreadable
    /// documents are recorded and skipped.
    pub fn load(store: &dyn FileStore) -> Result<Self, StoreError> {
        let paths = store.list_documents().map_err(|err| match err {
            StoreError::Unavailable { .. } => err,
            other => StoreError::Unavailable {
                root: store.describe(),
                message: other.to_string(),
            },
        })?;

        let mut texts = Vec::with_capacity(paths.len());
        let mut failures = Vec::new();
        for path in paths {
            match store.read(&path) {
                Ok(text) => texts.push((path, text)),
                Err(err) => {
                    tracing::warn!(path = %path, error = %err, "skipping unreadable document");
                    failures.push(ReadFailure {
                        path: normalize_rel_path(&path),
                        message: err.to_string(),
                    });
                }
            }
        }

        let mut snapshot = Self::from_texts(texts);
        failures.sort_by(|a, b| a.path.cmp(&b.path));
        snapshot.failures = failures;
        tracing::info!(
            store = %store.describe(),
            documents = snapshot.files.len(),
            unreadable = snapshot.failures.len(),
            sha256 = %snapshot.sha256,
            "loaded vault snapshot"
        );
        Ok(snapshot)
    }

    pub fn from_texts<P: AsRef<str>>(texts: impl IntoIterator<Item = (P, String)>) -> Self {
        let mut by_path = BTreeMap::new();
        for (path, text) in texts {
            let path = normalize_rel_path(path.as_ref());
            by_path.insert(path, text);
        }
        let files: Vec<RawFile> = by_path
            .into_iter()
            .map(|(path, text)| RawFile {
                sha256: sha256_hex(text.as_bytes()),
                path,
                text,
            })
            .collect();
        let sha256 = content_hash(&files);
        Self {
            files,
            failures: Vec::new(),
            sha256,
        }
    }

    pub fn files(&self) -> &[RawFile] {
        &self.files
    }

    pub fn failures(&self) -> &[ReadFailure] {
        &self.failures
    }

    /// SHA-256 over the canonical JSON object `{path: sha256(content)}`.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    pub fn get(&self, path: &str) -> Option<&RawFile> {
        let path = normalize_rel_path(path);
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(&path))
            .ok()
            .map(|idx| &self.files[idx])
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn content_hash(files: &[RawFile]) -> String {
    // BTreeMap keys serialize sorted and serde_json writes no whitespace.
    let manifest: BTreeMap<&str, &str> = files
        .iter()
        .map(|f| (f.path.as_str(), f.sha256.as_str()))
        .collect();
    let canonical = serde_json::to_vec(&manifest).unwrap_or_default();
    sha256_hex(&canonical)
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_ignores_input_order() {
        let a = RawSnapshot::from_texts(vec![("b.md", "B".to_string()), ("a.md", "A".to_string())]);
        let b = RawSnapshot::from_texts(vec![("a.md", "A".to_string()), ("b.md", "B".to_string())]);
        assert_eq!(a.sha256(), b.sha256());
        assert_eq!(a.files()[0].path, "a.md");
    }

    #[test]
    fn hash_covers_content_and_paths() {
        let base = RawSnapshot::from_texts(vec![("a.md", "A".to_string())]);
        let edited = RawSnapshot::from_texts(vec![("a.md", "A!".to_string())]);
        let moved = RawSnapshot::from_texts(vec![("b.md", "A".to_string())]);
        assert_ne!(base.sha256(), edited.sha256());
        assert_ne!(base.sha256(), moved.sha256());
    }

    #[test]
    fn manifest_is_compact_sorted_json() {
        let snap = RawSnapshot::from_texts(vec![("z.md", String::new()), ("a.md", String::new())]);
        let empty = sha256_hex(b"");
        let manifest = format!("{{\"a.md\":\"{empty}\",\"z.md\":\"{empty}\"}}");
        assert_eq!(snap.sha256(), sha256_hex(manifest.as_bytes()));
    }
}
