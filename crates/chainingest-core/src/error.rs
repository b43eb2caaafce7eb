//! Error types for the ChainIngest pipeline.

use thiserror::Error;

/// Errors raised while constructing the contract registry.
///
/// A failure on the top-level contracts file is fatal; per-entry failures are
/// downgraded to warnings by the loader and never surface as this type.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Contract registry file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid JSON in contract registry {path}: {reason}")]
    InvalidJson { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw payload failed to parse against the block wire schema.
#[derive(Debug, Error)]
#[error("block payload does not match the raw schema: {reason}")]
pub struct ValidationError {
    pub reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while decoding a block, transaction, or log.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid hex value '{value}': {reason}")]
    InvalidHex { value: String, reason: String },

    #[error("ABI decode failed: {reason}")]
    AbiDecodeFailed { reason: String },

    #[error("No function found for selector {selector}")]
    SelectorNotFound { selector: String },

    #[error("No valid transactions found in block {block_number}")]
    NoTransactions { block_number: u64 },

    #[error("No valid receipts found in block {block_number}")]
    NoReceipts { block_number: u64 },

    #[error("Transaction set and receipt set diverge: {tx_only} tx-only, {receipt_only} receipt-only")]
    TxReceiptMismatch { tx_only: usize, receipt_only: usize },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Object-store I/O failures (download, upload, list). Generally transient;
/// a reprocess retries the block.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {path}")]
    NotFound { path: String },

    #[error("IO error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors from the relational status store.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Block {block_number} not found in records")]
    BlockNotFound { block_number: u64 },

    #[error("Database error: {0}")]
    Database(String),
}

/// A raw object path matched none of the configured naming schemes.
#[derive(Debug, Error)]
#[error("no path scheme matched '{path}'")]
pub struct PathError {
    pub path: String,
}

impl PathError {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}
