//! The dependency-injected pipeline context.
//!
//! Constructed once at startup and threaded through the processor and batch
//! runner. There is no global singleton state: every component receives its
//! collaborators explicitly, so tests can swap in memory-backed doubles.

use std::sync::Arc;
use thiserror::Error;

use chainingest_core::error::{RegistryError, StatusError, StorageError};
use chainingest_evm::{BlockDecoder, BlockValidator, ContractManager};
use chainingest_registry::ContractRegistry;
use chainingest_storage::{BlockStore, LocalObjectStore, ObjectStore, StatusStore};

use crate::batch::BatchRunner;
use crate::config::PipelineConfig;
use crate::processor::BlockProcessor;

/// Infrastructure-level construction failures. These abort the run — unlike
/// per-block failures, which are absorbed into processing outcomes.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Status store error: {0}")]
    Status(#[from] StatusError),
}

/// All pipeline components, built once from a [`PipelineConfig`].
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub registry: Arc<ContractRegistry>,
    pub manager: Arc<ContractManager>,
    pub block_store: Arc<BlockStore>,
    pub status: StatusStore,
}

impl PipelineContext {
    /// Build the context with the local filesystem object store and the
    /// configured SQLite database.
    pub fn new(config: PipelineConfig) -> Result<Self, ContextError> {
        let object_store: Arc<dyn ObjectStore> =
            Arc::new(LocalObjectStore::open(&config.data_dir)?);
        let status = StatusStore::open(&config.database_path)?;
        Self::assemble(config, object_store, status)
    }

    /// Build the context around externally supplied stores (tests, alternate
    /// backends).
    pub fn assemble(
        config: PipelineConfig,
        object_store: Arc<dyn ObjectStore>,
        status: StatusStore,
    ) -> Result<Self, ContextError> {
        let registry = Arc::new(ContractRegistry::load(
            &config.contracts_file,
            &config.abi_dir,
        )?);
        Ok(Self::assemble_with_registry(
            config,
            registry,
            object_store,
            status,
        ))
    }

    /// Build the context around a pre-built registry.
    pub fn assemble_with_registry(
        config: PipelineConfig,
        registry: Arc<ContractRegistry>,
        object_store: Arc<dyn ObjectStore>,
        status: StatusStore,
    ) -> Self {
        let manager = Arc::new(ContractManager::new(registry.clone()));
        let block_store = Arc::new(BlockStore::new(object_store, config.layout()));
        Self {
            config,
            registry,
            manager,
            block_store,
            status,
        }
    }

    /// A processor wired to this context's components.
    pub fn processor(&self) -> BlockProcessor {
        let decoder =
            BlockDecoder::new(self.manager.clone()).with_diff_policy(self.config.diff_policy);
        BlockProcessor::new(
            self.block_store.clone(),
            self.status.clone(),
            BlockValidator::new(),
            decoder,
        )
    }

    /// A batch runner wired to this context's components.
    pub fn batch_runner(&self) -> BatchRunner {
        BatchRunner::new(self.processor(), self.block_store.clone(), self.status.clone())
    }
}
