//! # chainingest-storage
//!
//! The pipeline's storage layer:
//! - [`object`] — the blocking `ObjectStore` trait
//! - [`local`], [`memory`] — filesystem and in-memory backends
//! - [`layout`] — path templates and the ordered block-number parsers
//! - [`blocks`] — raw payload fetch + decoded artifact persistence
//! - [`status`] — SQLite-backed processing status and object inventory

pub mod blocks;
pub mod layout;
pub mod local;
pub mod memory;
pub mod object;
pub mod status;

pub use blocks::BlockStore;
pub use layout::{BlockLayout, FileType, PathScheme};
pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use object::{ObjectInfo, ObjectStore};
pub use status::{BlockRecord, ProcessingStatus, StatusStore, StoredObject};
