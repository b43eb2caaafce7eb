//! Batch orchestration: selection, inventory sync, chunking, skipping, and
//! aggregate reporting.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use chainingest_core::error::{StatusError, StorageError};
use chainingest_storage::{BlockStore, FileType, ProcessingStatus, StatusStore, StoredObject};

use crate::processor::{BlockProcessor, ProcessOutcome};

/// Infrastructure failures during selection or inventory sync. Per-item
/// processing failures never surface here — they are counted in the report.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Status store error: {0}")]
    Status(#[from] StatusError),
}

/// How to pick the blocks for one run. Strategies are mutually exclusive.
#[derive(Debug, Clone)]
pub enum BlockSelection {
    /// Random sample of N from the available raw objects.
    Sample(usize),
    /// Explicit block numbers, existence-checked against the inventory.
    Numbers(Vec<u64>),
    /// All blocks currently in a status, bounded by `limit`.
    ByStatus {
        status: ProcessingStatus,
        limit: usize,
    },
    /// Numeric range `[min, max]`, optionally filtered by status.
    Range {
        min: u64,
        max: u64,
        status: Option<ProcessingStatus>,
    },
    /// Externally supplied object paths.
    Paths(Vec<String>),
}

/// Options for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Split the selection into fixed-size chunks; `None` = one chunk.
    pub chunk_size: Option<usize>,
    /// Process even when a decoded artifact already exists.
    pub force: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            chunk_size: None,
            force: false,
        }
    }
}

/// Stats for one processed chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkStats {
    pub index: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Per-item detail kept in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    pub path: String,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ProcessOutcome>,
}

/// Aggregate result of a batch run.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub chunks: Vec<ChunkStats>,
    pub details: Vec<ItemResult>,
}

impl BatchReport {
    /// Write the report as pretty-printed JSON.
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)
    }
}

/// Selects, chunks, skips, and processes batches of blocks.
pub struct BatchRunner {
    processor: BlockProcessor,
    block_store: Arc<BlockStore>,
    status: StatusStore,
}

impl BatchRunner {
    pub fn new(processor: BlockProcessor, block_store: Arc<BlockStore>, status: StatusStore) -> Self {
        Self {
            processor,
            block_store,
            status,
        }
    }

    /// Refresh the object inventory from the backing store in bounded pages.
    ///
    /// Idempotent upsert by path; returns the number of objects synced.
    pub fn sync_inventory(
        &self,
        prefix: Option<&str>,
        limit: Option<usize>,
        page_size: usize,
    ) -> Result<usize, BatchError> {
        let layout = self.block_store.layout();
        let mut listed = self.block_store.object_store().list(prefix.unwrap_or(""))?;
        if let Some(limit) = limit {
            listed.truncate(limit);
        }

        let mut count = 0usize;
        for page in listed.chunks(page_size.max(1)) {
            let rows: Vec<StoredObject> = page
                .iter()
                .map(|obj| StoredObject {
                    block_number: layout.block_number(&obj.path).ok(),
                    file_type: layout.classify(&obj.path),
                    path: obj.path.clone(),
                    size: Some(obj.size),
                    updated_at: obj.updated,
                })
                .collect();
            count += self.status.upsert_objects(&rows)?;
        }

        info!(count, "object inventory synced");
        Ok(count)
    }

    /// Resolve a selection strategy to a list of raw object paths.
    pub fn select(&self, selection: &BlockSelection) -> Result<Vec<String>, BatchError> {
        let layout = self.block_store.layout();
        match selection {
            BlockSelection::Sample(n) => {
                let mut available = self.status.object_paths(FileType::Raw, None, None, None)?;
                if available.is_empty() {
                    // Inventory not synced — fall back to a live listing
                    available = self
                        .block_store
                        .object_store()
                        .list(&layout.raw_prefix)?
                        .into_iter()
                        .map(|o| o.path)
                        .collect();
                }
                if available.len() <= *n {
                    return Ok(available);
                }
                let mut rng = rand::thread_rng();
                Ok(available
                    .choose_multiple(&mut rng, *n)
                    .cloned()
                    .collect())
            }

            BlockSelection::Numbers(numbers) => {
                let mut paths = Vec::with_capacity(numbers.len());
                for &n in numbers {
                    let path = layout.raw_path(n);
                    let known = self.status.object_exists(n, FileType::Raw)?
                        || self.block_store.object_store().exists(&path)?;
                    if known {
                        paths.push(path);
                    } else {
                        warn!(block = n, %path, "block not found, dropping from selection");
                    }
                }
                Ok(paths)
            }

            BlockSelection::ByStatus { status, limit } => Ok(self
                .status
                .blocks_by_status(*status, *limit)?
                .into_iter()
                .map(|r| r.gcs_path)
                .collect()),

            BlockSelection::Range { min, max, status } => {
                if status.is_some() {
                    return Ok(self
                        .status
                        .blocks_in_range(*min, *max, *status)?
                        .into_iter()
                        .map(|r| r.gcs_path)
                        .collect());
                }
                let paths =
                    self.status
                        .object_paths(FileType::Raw, Some(*min), Some(*max), None)?;
                if !paths.is_empty() {
                    return Ok(paths);
                }
                // Inventory empty — probe the store directly
                let mut probed = Vec::new();
                for n in *min..=*max {
                    let path = layout.raw_path(n);
                    if self.block_store.object_store().exists(&path)? {
                        probed.push(path);
                    }
                }
                Ok(probed)
            }

            BlockSelection::Paths(paths) => Ok(paths.clone()),
        }
    }

    /// Process a list of paths with optional chunking and skip-if-exists.
    ///
    /// One item's failure is counted and never aborts the run.
    pub fn run(&self, paths: &[String], opts: &BatchOptions) -> BatchReport {
        let started_at = Utc::now();
        let run_start = Instant::now();

        let mut report = BatchReport {
            total: paths.len(),
            succeeded: 0,
            failed: 0,
            skipped: 0,
            started_at,
            ended_at: started_at,
            duration_ms: 0,
            chunks: Vec::new(),
            details: Vec::with_capacity(paths.len()),
        };

        if paths.is_empty() {
            warn!("no blocks to process");
            return report;
        }

        let chunk_size = opts.chunk_size.unwrap_or(paths.len()).max(1);
        info!(total = paths.len(), chunk_size, force = opts.force, "processing batch");

        for (chunk_index, chunk) in paths.chunks(chunk_size).enumerate() {
            let chunk_start = Instant::now();
            let mut stats = ChunkStats {
                index: chunk_index,
                total: chunk.len(),
                succeeded: 0,
                failed: 0,
                skipped: 0,
                duration_ms: 0,
            };

            for path in chunk {
                if !opts.force && self.decoded_already_exists(path) {
                    stats.skipped += 1;
                    report.details.push(ItemResult {
                        path: path.clone(),
                        skipped: true,
                        outcome: None,
                    });
                    continue;
                }

                let outcome = self.processor.process(path);
                if outcome.success {
                    stats.succeeded += 1;
                } else {
                    stats.failed += 1;
                }
                report.details.push(ItemResult {
                    path: path.clone(),
                    skipped: false,
                    outcome: Some(outcome),
                });
            }

            stats.duration_ms = chunk_start.elapsed().as_millis() as u64;
            report.succeeded += stats.succeeded;
            report.failed += stats.failed;
            report.skipped += stats.skipped;
            info!(
                chunk = chunk_index,
                succeeded = stats.succeeded,
                failed = stats.failed,
                skipped = stats.skipped,
                "chunk complete"
            );
            report.chunks.push(stats);
        }

        report.ended_at = Utc::now();
        report.duration_ms = run_start.elapsed().as_millis() as u64;
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "batch complete"
        );
        report
    }

    /// Whether a decoded artifact already exists for the block at `path`.
    ///
    /// Checks the inventory first and falls back to a direct store probe; an
    /// unparseable path is treated as not-yet-decoded and processed normally.
    fn decoded_already_exists(&self, path: &str) -> bool {
        let Ok(block_number) = self.block_store.layout().block_number(path) else {
            return false;
        };
        if self
            .status
            .object_exists(block_number, FileType::Decoded)
            .unwrap_or(false)
        {
            return true;
        }
        self.block_store.decoded_exists(block_number).unwrap_or(false)
    }
}
