//! # chainingest-registry
//!
//! Loads the contract registry: a two-level `contracts.json` mapping
//! category → address → metadata, plus one ABI JSON file per address under a
//! matching directory. A malformed top-level file is fatal; a malformed or
//! missing per-entry file is logged and skipped.

mod registry;

pub use registry::{AbiFile, ContractEntry, ContractMetadata, ContractRegistry};
