//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use chainingest_evm::DiffPolicy;
use chainingest_observability::LogConfig;
use chainingest_storage::{BlockLayout, PathScheme};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid config in {path}: {reason}")]
    Invalid { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level pipeline configuration.
///
/// Every field has a default so a config file only needs to override what
/// differs from the development layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory for the local object store backend.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// The top-level contracts registry file.
    #[serde(default = "default_contracts_file")]
    pub contracts_file: PathBuf,
    /// Directory holding per-address ABI files, one subdirectory per category.
    #[serde(default = "default_abi_dir")]
    pub abi_dir: PathBuf,
    /// SQLite database path for status and inventory.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Prefix for raw block objects.
    #[serde(default = "default_raw_prefix")]
    pub raw_prefix: String,
    /// Prefix for decoded artifacts.
    #[serde(default = "default_decoded_prefix")]
    pub decoded_prefix: String,
    /// File-name stem used when building raw paths from block numbers.
    #[serde(default = "default_raw_stem")]
    pub raw_stem: String,
    /// Ordered raw-path parsers, most to least specific.
    #[serde(default = "default_schemes")]
    pub path_schemes: Vec<PathScheme>,
    /// How to treat tx/receipt set divergence.
    #[serde(default)]
    pub diff_policy: DiffPolicy,
    /// Age after which a `processing` row is considered stale.
    #[serde(default = "default_stale_age_secs")]
    pub stale_age_secs: u64,
    /// Inventory sync page size.
    #[serde(default = "default_sync_page_size")]
    pub sync_page_size: usize,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_contracts_file() -> PathBuf {
    PathBuf::from("./config/contracts.json")
}
fn default_abi_dir() -> PathBuf {
    PathBuf::from("./config/abis")
}
fn default_database_path() -> PathBuf {
    PathBuf::from("./data/chainingest.db")
}
fn default_raw_prefix() -> String {
    "raw/".to_string()
}
fn default_decoded_prefix() -> String {
    "decoded/".to_string()
}
fn default_raw_stem() -> String {
    "quicknode_avalanche-mainnet_block_with_receipts".to_string()
}
fn default_schemes() -> Vec<PathScheme> {
    vec![
        PathScheme::RangeSuffix,
        PathScheme::NumberSuffix,
        PathScheme::BareNumber,
    ]
}
fn default_stale_age_secs() -> u64 {
    3_600
}
fn default_sync_page_size() -> usize {
    1_000
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            contracts_file: default_contracts_file(),
            abi_dir: default_abi_dir(),
            database_path: default_database_path(),
            raw_prefix: default_raw_prefix(),
            decoded_prefix: default_decoded_prefix(),
            raw_stem: default_raw_stem(),
            path_schemes: default_schemes(),
            diff_policy: DiffPolicy::default(),
            stale_age_secs: default_stale_age_secs(),
            sync_page_size: default_sync_page_size(),
            log: LogConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file, filling unspecified fields with defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::Io(e)
            }
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Invalid {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// The block layout implied by this config.
    pub fn layout(&self) -> BlockLayout {
        BlockLayout::new(
            self.raw_prefix.clone(),
            self.decoded_prefix.clone(),
            self.raw_stem.clone(),
        )
        .with_schemes(self.path_schemes.clone())
    }
}
