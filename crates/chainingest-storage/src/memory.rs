//! In-memory `ObjectStore` for tests and ephemeral pipelines.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

use chainingest_core::error::StorageError;

use crate::object::{ObjectInfo, ObjectStore};

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StorageError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, (data, updated))| ObjectInfo {
                path: path.clone(),
                size: data.len() as u64,
                updated: *updated,
            })
            .collect())
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(path)
            .map(|(data, _)| data.clone()))
    }

    fn put(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), (data.to_vec(), Utc::now()));
        Ok(())
    }

    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.objects.lock().unwrap().contains_key(path))
    }

    fn delete(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.objects.lock().unwrap().remove(path).is_some())
    }
}
