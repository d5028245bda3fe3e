use grove_core::config::VaultConfig;
use grove_core::StoreError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::store::{normalize_rel_path, FileStore};

/// Documents stored as files under a vault root directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    ignore: Vec<String>,
    extensions: Vec<String>,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>, vault: &VaultConfig) -> Self {
        Self {
            root: root.into(),
            ignore: vault.ignore.clone(),
            extensions: vault
                .extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a vault-relative path is excluded by the configured ignore globs.
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let rel_path = normalize_rel_path(rel_path);
        self.ignore
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &rel_path))
    }

    fn has_document_extension(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Resolve a vault-relative path, refusing anything that climbs out of the root.
    fn resolve(&self, rel_path: &str) -> Option<PathBuf> {
        let rel = PathBuf::from(normalize_rel_path(rel_path));
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        (!escapes).then(|| self.root.join(rel))
    }

    fn collect(&self, dir: &Path, rel_dir: &str, out: &mut Vec<String>) -> Result<(), StoreError> {
        let entries = fs::read_dir(dir).map_err(|err| StoreError::Read {
            path: dir.display().to_string(),
            message: err.to_string(),
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::Read {
                path: dir.display().to_string(),
                message: err.to_string(),
            })?;
            paths.push(entry.path());
        }
        paths.sort();

        for path in paths {
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            let rel = if rel_dir.is_empty() {
                name.to_string()
            } else {
                format!("{rel_dir}/{name}")
            };
            if path.is_dir() {
                if name == ".git" {
                    continue;
                }
                self.collect(&path, &rel, out)?;
            } else if self.has_document_extension(name) && !self.is_ignored(&rel) {
                out.push(rel);
            }
        }
        Ok(())
    }
}

impl FileStore for FsStore {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn list_documents(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::Unavailable {
                root: self.describe(),
                message: "not a directory".to_string(),
            });
        }
        let mut out = Vec::new();
        self.collect(&self.root, "", &mut out)
            .map_err(|err| StoreError::Unavailable {
                root: self.describe(),
                message: err.to_string(),
            })?;
        tracing::debug!(root = %self.root.display(), documents = out.len(), "listed vault");
        Ok(out)
    }

    fn read(&self, path: &str) -> Result<String, StoreError> {
        let abs = self.resolve(path).ok_or_else(|| StoreError::Read {
            path: path.to_string(),
            message: "path escapes the vault root".to_string(),
        })?;
        fs::read_to_string(&abs).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
            _ => StoreError::Read {
                path: path.to_string(),
                message: err.to_string(),
            },
        })
    }

    fn write(&self, path: &str, text: &str) -> Result<(), StoreError> {
        let write_err = |message: String| StoreError::Write {
            path: path.to_string(),
            message,
        };
        let abs = self
            .resolve(path)
            .ok_or_else(|| write_err("path escapes the vault root".to_string()))?;
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).map_err(|err| write_err(err.to_string()))?;
        }
        // Write beside the target, then swap it in.
        let tmp = abs.with_extension("grove-tmp");
        fs::write(&tmp, text).map_err(|err| write_err(err.to_string()))?;
        fs::rename(&tmp, &abs).map_err(|err| write_err(err.to_string()))?;
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        let abs = self.resolve(path).ok_or_else(|| StoreError::Remove {
            path: path.to_string(),
            message: "path escapes the vault root".to_string(),
        })?;
        fs::remove_file(&abs).map_err(|err| match err.kind() {
            ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
            _ => StoreError::Remove {
                path: path.to_string(),
                message: err.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignore_globs_use_vault_relative_paths() {
        let store = FsStore::new("/vault", &VaultConfig::default());
        assert!(store.is_ignored("templates/standard.md"));
        assert!(store.is_ignored(".obsidian/workspace.md"));
        assert!(!store.is_ignored("Concepts/templates.md"));
        assert!(store.has_document_extension("Note.MD"));
        assert!(!store.has_document_extension("diagram.png"));
    }

    #[test]
    fn refuses_paths_outside_the_root() {
        let store = FsStore::new("/vault", &VaultConfig::default());
        assert!(store.resolve("../etc/passwd").is_none());
        assert_eq!(
            store.resolve("Concepts/a.md"),
            Some(PathBuf::from("/vault/Concepts/a.md"))
        );
    }
}
