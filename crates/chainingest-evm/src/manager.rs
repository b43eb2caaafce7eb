//! `ContractManager` — lazily builds and caches one codec per address.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chainingest_registry::ContractRegistry;

use crate::contract::ContractCodec;

/// Memoizes one [`ContractCodec`] per lowercased address, built on first use.
///
/// Codecs are immutable for the process lifetime — an ABI change requires a
/// restart; there is no invalidation path. Safe for concurrent read-only use
/// once populated.
pub struct ContractManager {
    registry: Arc<ContractRegistry>,
    codecs: RwLock<HashMap<String, Arc<ContractCodec>>>,
}

impl ContractManager {
    pub fn new(registry: Arc<ContractRegistry>) -> Self {
        Self {
            registry,
            codecs: RwLock::new(HashMap::new()),
        }
    }

    /// Get or build the codec for an address in the registry.
    pub fn get(&self, address: &str) -> Option<Arc<ContractCodec>> {
        let address = address.to_ascii_lowercase();

        if let Some(codec) = self.codecs.read().unwrap().get(&address) {
            return Some(codec.clone());
        }

        let entry = self.registry.get(&address)?;
        let codec = Arc::new(ContractCodec::new(entry.metadata.name.clone(), &entry.abi));

        let mut codecs = self.codecs.write().unwrap();
        Some(codecs.entry(address).or_insert(codec).clone())
    }

    /// Pure membership check against the registry — never builds a codec.
    pub fn has(&self, address: &str) -> bool {
        self.registry.get(address).is_some()
    }

    /// Number of codecs built so far.
    pub fn built(&self) -> usize {
        self.codecs.read().unwrap().len()
    }
}
