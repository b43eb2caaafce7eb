//! The per-block processor state machine.
//!
//! `process` drives one block through validate → decode → store, updating the
//! status row at entry (`processing`) and exit (`valid` / `invalid`). Every
//! exit path returns a structured outcome surfaced verbatim to callers —
//! nothing is swallowed, and under non-crash execution no block ends in a
//! non-terminal state.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use chainingest_evm::{BlockDecoder, BlockValidator};
use chainingest_storage::{BlockStore, ProcessingStatus, StatusStore};

/// Structured result of one `process` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub validation: bool,
    pub decoding: bool,
    pub storage: bool,
    pub errors: Vec<String>,
}

/// Aggregate result of `reprocess_many`.
#[derive(Debug, Serialize)]
pub struct ReprocessReport {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub details: Vec<(u64, ProcessOutcome)>,
}

/// Orchestrates validate → decode → store for one block.
pub struct BlockProcessor {
    block_store: Arc<BlockStore>,
    status: StatusStore,
    validator: BlockValidator,
    decoder: BlockDecoder,
}

impl BlockProcessor {
    pub fn new(
        block_store: Arc<BlockStore>,
        status: StatusStore,
        validator: BlockValidator,
        decoder: BlockDecoder,
    ) -> Self {
        Self {
            block_store,
            status,
            validator,
            decoder,
        }
    }

    /// Process a block from its raw object path.
    pub fn process(&self, gcs_path: &str) -> ProcessOutcome {
        let mut outcome = ProcessOutcome::default();

        let block_number = match self.block_store.layout().block_number(gcs_path) {
            Ok(n) => n,
            Err(e) => {
                // No block number means no addressable status row
                outcome.errors.push(format!("Processing error: {e}"));
                return outcome;
            }
        };

        if let Err(e) =
            self.status
                .record_block(block_number, gcs_path, ProcessingStatus::Processing)
        {
            outcome.errors.push(format!("Status store error: {e}"));
            return outcome;
        }

        let payload = match self.block_store.fetch_raw(gcs_path) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return self.fail(
                    block_number,
                    outcome,
                    format!("Failed to download block from {gcs_path}"),
                );
            }
            Err(e) => {
                return self.fail(
                    block_number,
                    outcome,
                    format!("Failed to download block from {gcs_path}: {e}"),
                );
            }
        };

        let raw_block = match self.validator.validate(&payload) {
            Ok(block) => block,
            Err(e) => {
                return self.fail(
                    block_number,
                    outcome,
                    format!("Validation failed: {}", e.reason),
                );
            }
        };
        outcome.validation = true;

        let decoded = match self.decoder.decode(&raw_block) {
            Ok(d) => d,
            Err(e) => {
                return self.fail(block_number, outcome, format!("Decoding failed: {e}"));
            }
        };
        outcome.decoding = true;

        if let Err(e) = self.block_store.store_decoded(block_number, &decoded.block) {
            return self.fail(block_number, outcome, format!("Storage failed: {e}"));
        }
        outcome.storage = true;

        if let Err(e) = self
            .status
            .update_status(block_number, ProcessingStatus::Valid, None)
        {
            outcome.errors.push(format!("Status store error: {e}"));
            return outcome;
        }

        outcome.success = true;
        info!(
            block = block_number,
            transactions = decoded.block.transactions.len(),
            dropped = decoded.dropped.len(),
            "block processed"
        );
        outcome
    }

    /// Re-enter `process` via the recorded path for a block number.
    ///
    /// An absent record fails immediately with no side effects.
    pub fn reprocess(&self, block_number: u64) -> ProcessOutcome {
        match self.status.get_block(block_number) {
            Ok(Some(record)) => self.process(&record.gcs_path),
            Ok(None) => ProcessOutcome {
                errors: vec![format!("Block {block_number} not found in records")],
                ..ProcessOutcome::default()
            },
            Err(e) => ProcessOutcome {
                errors: vec![format!("Status store error: {e}")],
                ..ProcessOutcome::default()
            },
        }
    }

    /// Reprocess a list of block numbers, aggregating results.
    pub fn reprocess_many(&self, block_numbers: &[u64]) -> ReprocessReport {
        let mut report = ReprocessReport {
            total: block_numbers.len(),
            success: 0,
            failure: 0,
            details: Vec::with_capacity(block_numbers.len()),
        };
        for &block_number in block_numbers {
            let outcome = self.reprocess(block_number);
            if outcome.success {
                report.success += 1;
            } else {
                report.failure += 1;
            }
            report.details.push((block_number, outcome));
        }
        report
    }

    /// Mark the block invalid with the error text and record it on the outcome.
    fn fail(&self, block_number: u64, mut outcome: ProcessOutcome, msg: String) -> ProcessOutcome {
        warn!(block = block_number, error = %msg, "block processing failed");
        if let Err(e) = self
            .status
            .update_status(block_number, ProcessingStatus::Invalid, Some(msg.as_str()))
        {
            outcome.errors.push(format!("Status store error: {e}"));
        }
        outcome.errors.push(msg);
        outcome
    }
}
