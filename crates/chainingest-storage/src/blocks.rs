//! `BlockStore` — raw payload fetch and decoded artifact persistence.

use std::sync::Arc;
use tracing::debug;

use chainingest_core::block::Block;
use chainingest_core::error::StorageError;

use crate::layout::BlockLayout;
use crate::object::ObjectStore;

/// Couples an [`ObjectStore`] with the [`BlockLayout`] path templates.
pub struct BlockStore {
    store: Arc<dyn ObjectStore>,
    layout: BlockLayout,
}

impl BlockStore {
    pub fn new(store: Arc<dyn ObjectStore>, layout: BlockLayout) -> Self {
        Self { store, layout }
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Download a raw payload by full path.
    pub fn fetch_raw(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.store.get(path)
    }

    /// Persist the decoded artifact; returns the path written.
    pub fn store_decoded(&self, block_number: u64, block: &Block) -> Result<String, StorageError> {
        let path = self.layout.decoded_path(block_number);
        let payload = serde_json::to_vec(block)?;
        self.store.put(&path, &payload)?;
        debug!(block = block_number, path = %path, bytes = payload.len(), "decoded artifact stored");
        Ok(path)
    }

    /// Load a previously stored decoded artifact.
    pub fn get_decoded(&self, block_number: u64) -> Result<Option<Block>, StorageError> {
        let path = self.layout.decoded_path(block_number);
        match self.store.get(&path)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Existence probe for a decoded artifact.
    pub fn decoded_exists(&self, block_number: u64) -> Result<bool, StorageError> {
        self.store.exists(&self.layout.decoded_path(block_number))
    }
}
