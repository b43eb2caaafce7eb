//! # chainingest-core
//!
//! Shared types for the ChainIngest decode pipeline:
//! - [`types`] — 0x-prefixed hex string primitives and conversion helpers
//! - [`evm`] — the raw block wire schema as exported by the RPC stream
//! - [`block`] — the decoded output model persisted as the block artifact
//! - [`error`] — one error enum per pipeline concern

pub mod block;
pub mod error;
pub mod evm;
pub mod types;

pub use block::{Block, DecodedLog, DecodedMethod, EncodedLog, EncodedMethod, LogEntry, Method, Transaction};
pub use error::{DecodeError, PathError, RegistryError, StatusError, StorageError, ValidationError};
pub use evm::{EvmFilteredBlock, EvmLog, EvmTransaction, EvmTxReceipt};
pub use types::{EvmAddress, EvmHash, HexInt, HexStr};
