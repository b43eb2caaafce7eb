//! # chainingest-observability
//!
//! Tracing / logging initialisation helpers shared by the CLI and any
//! embedding service.

mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
