//! Filesystem-backed `ObjectStore`.
//!
//! Object keys are forward-slash paths relative to a root directory. Suitable
//! for development and for air-gapped reprocessing of downloaded exports.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use chainingest_core::error::StorageError;

use crate::object::{ObjectInfo, ObjectStore};

/// Object store rooted at a local directory.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create the store, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| StorageError::Io {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { root })
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn io_err(path: &str, e: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.to_string(),
            reason: e.to_string(),
        }
    }

    fn walk(&self, dir: &Path, out: &mut Vec<ObjectInfo>) -> Result<(), StorageError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Self::io_err(&dir.display().to_string(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Self::io_err(&dir.display().to_string(), e))?;
            let path = entry.path();
            if path.is_dir() {
                self.walk(&path, out)?;
            } else {
                let meta = entry
                    .metadata()
                    .map_err(|e| Self::io_err(&path.display().to_string(), e))?;
                let updated: DateTime<Utc> = meta
                    .modified()
                    .map(DateTime::from)
                    .unwrap_or_else(|_| Utc::now());
                let key = path
                    .strip_prefix(&self.root)
                    .unwrap_or(&path)
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push(ObjectInfo {
                    path: key,
                    size: meta.len(),
                    updated,
                });
            }
        }
        Ok(())
    }
}

impl ObjectStore for LocalObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        let mut all = Vec::new();
        if self.root.is_dir() {
            self.walk(&self.root, &mut all)?;
        }
        all.retain(|o| o.path.starts_with(prefix));
        all.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(all)
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(self.full_path(path)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(path, e)),
        }
    }

    fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Self::io_err(path, e))?;
        }
        std::fs::write(&full, data).map_err(|e| Self::io_err(path, e))
    }

    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.full_path(path).is_file())
    }

    fn delete(&self, path: &str) -> Result<bool, StorageError> {
        match std::fs::remove_file(self.full_path(path)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Self::io_err(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn put_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path()).unwrap();

        store.put("raw/blocks/000000000100.json", b"{}").unwrap();
        assert_eq!(
            store.get("raw/blocks/000000000100.json").unwrap().unwrap(),
            b"{}"
        );
        assert!(store.exists("raw/blocks/000000000100.json").unwrap());
        assert!(store.get("raw/missing.json").unwrap().is_none());
    }

    #[test]
    fn list_filters_by_prefix_and_sorts() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path()).unwrap();

        store.put("raw/b.json", b"b").unwrap();
        store.put("raw/a.json", b"a").unwrap();
        store.put("decoded/c.json", b"c").unwrap();

        let raw = store.list("raw/").unwrap();
        let paths: Vec<_> = raw.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["raw/a.json", "raw/b.json"]);
    }

    #[test]
    fn delete_reports_existence() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::open(dir.path()).unwrap();

        store.put("x.json", b"x").unwrap();
        assert!(store.delete("x.json").unwrap());
        assert!(!store.delete("x.json").unwrap());
    }
}
