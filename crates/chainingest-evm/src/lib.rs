//! # chainingest-evm
//!
//! ABI-driven decoding for the pipeline:
//! - [`contract`] — `ContractCodec`, one ABI-bound decode handle per contract
//! - [`manager`] — lazily builds and caches codecs for registry addresses
//! - [`normalizer`] — ABI values → JSON values for the decoded artifact
//! - [`validator`] — raw payload → typed [`chainingest_core::EvmFilteredBlock`]
//! - [`log`], [`transaction`], [`block`] — the decode pipeline proper, with
//!   graceful fallback to encoded forms

pub mod block;
pub mod contract;
pub mod log;
pub mod manager;
pub mod normalizer;
pub mod transaction;
pub mod validator;

pub use block::{BlockDecoder, DecodedBlock, DiffPolicy, TxReceiptDiff};
pub use contract::{ContractCodec, DecodedEventData, DecodedFunction};
pub use manager::ContractManager;
pub use validator::BlockValidator;
