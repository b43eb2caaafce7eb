//! The `ObjectStore` trait — a minimal blocking get/put/list surface.
//!
//! The production deployment fronts a cloud bucket; development and tests use
//! the filesystem or memory backends. All calls are synchronous and
//! non-cancellable, matching the pipeline's sequential execution model.

use chrono::{DateTime, Utc};

use chainingest_core::error::StorageError;

/// Metadata for one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Forward-slash key relative to the store root.
    pub path: String,
    pub size: u64,
    pub updated: DateTime<Utc>,
}

/// Blocking object storage: list, download, upload, probe.
pub trait ObjectStore: Send + Sync {
    /// List objects under `prefix`, sorted by path.
    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Download an object; `Ok(None)` when it does not exist.
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Upload (create or overwrite) an object.
    fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Existence probe without a download.
    fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete an object; returns `false` when it did not exist.
    fn delete(&self, path: &str) -> Result<bool, StorageError>;
}
