//! # chainingest-pipeline
//!
//! Orchestration for the decode pipeline:
//! - [`config`] — pipeline configuration with serde defaults
//! - [`context`] — the dependency-injected context built once at startup
//! - [`processor`] — the per-block validate → decode → store state machine
//! - [`batch`] — selection strategies, inventory sync, chunking, skipping,
//!   and aggregate reporting

pub mod batch;
pub mod config;
pub mod context;
pub mod processor;

pub use batch::{BatchError, BatchOptions, BatchReport, BatchRunner, BlockSelection};
pub use config::{ConfigError, PipelineConfig};
pub use context::{ContextError, PipelineContext};
pub use processor::{BlockProcessor, ProcessOutcome, ReprocessReport};
