//! Block decoding: tx–receipt reconciliation and assembly of the decoded
//! artifact.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::warn;

use chainingest_core::block::Block;
use chainingest_core::error::DecodeError;
use chainingest_core::evm::{EvmFilteredBlock, EvmTransaction, EvmTxReceipt};
use chainingest_core::types::EvmHash;

use crate::manager::ContractManager;
use crate::transaction::TransactionDecoder;

/// How to treat hashes present in only one of the two raw sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffPolicy {
    /// Decode the intersection silently.
    Ignore,
    /// Decode the intersection and log the diff.
    #[default]
    Warn,
    /// Fail the block.
    Reject,
}

/// Hashes present in only one of the raw transaction / receipt sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceiptDiff {
    pub tx_only: BTreeSet<EvmHash>,
    pub receipt_only: BTreeSet<EvmHash>,
}

impl TxReceiptDiff {
    pub fn is_empty(&self) -> bool {
        self.tx_only.is_empty() && self.receipt_only.is_empty()
    }
}

/// The full result of decoding one block: the artifact plus diagnostics.
#[derive(Debug)]
pub struct DecodedBlock {
    pub block: Block,
    /// Tx/receipt asymmetry, if any.
    pub diff: Option<TxReceiptDiff>,
    /// Transactions dropped by a per-transaction decode failure.
    pub dropped: Vec<(EvmHash, String)>,
}

/// Reconciles transactions with receipts and decodes each pair.
pub struct BlockDecoder {
    tx_decoder: TransactionDecoder,
    diff_policy: DiffPolicy,
}

impl BlockDecoder {
    pub fn new(manager: Arc<ContractManager>) -> Self {
        Self {
            tx_decoder: TransactionDecoder::new(manager),
            diff_policy: DiffPolicy::default(),
        }
    }

    pub fn with_diff_policy(mut self, policy: DiffPolicy) -> Self {
        self.diff_policy = policy;
        self
    }

    /// Pair transactions with their receipts by hash.
    ///
    /// A block with zero transactions or zero receipts is malformed input,
    /// not a valid empty block. Hashes present in only one set are reported
    /// as a diff; the pairs cover exactly the hash-set intersection, in hash
    /// order.
    fn reconcile<'a>(
        &self,
        raw: &'a EvmFilteredBlock,
        block_number: u64,
    ) -> Result<
        (
            Vec<(&'a EvmTransaction, &'a EvmTxReceipt)>,
            Option<TxReceiptDiff>,
        ),
        DecodeError,
    > {
        let txs: BTreeMap<&str, &EvmTransaction> = raw
            .transactions
            .iter()
            .map(|tx| (tx.hash.as_str(), tx))
            .collect();
        let receipts: BTreeMap<&str, &EvmTxReceipt> = raw
            .receipts
            .iter()
            .map(|r| (r.transaction_hash.as_str(), r))
            .collect();

        if txs.is_empty() {
            return Err(DecodeError::NoTransactions { block_number });
        }
        if receipts.is_empty() {
            return Err(DecodeError::NoReceipts { block_number });
        }

        let pairs: Vec<_> = txs
            .iter()
            .filter_map(|(hash, tx)| receipts.get(hash).map(|receipt| (*tx, *receipt)))
            .collect();

        let tx_only: BTreeSet<EvmHash> = txs
            .keys()
            .filter(|h| !receipts.contains_key(*h))
            .map(|h| EvmHash::new(*h))
            .collect();
        let receipt_only: BTreeSet<EvmHash> = receipts
            .keys()
            .filter(|h| !txs.contains_key(*h))
            .map(|h| EvmHash::new(*h))
            .collect();

        let diff = TxReceiptDiff {
            tx_only,
            receipt_only,
        };
        let diff = if diff.is_empty() { None } else { Some(diff) };

        Ok((pairs, diff))
    }

    /// Decode a full block, including transactions and logs.
    ///
    /// A failure while decoding one transaction drops only that transaction;
    /// the rest of the block still decodes.
    pub fn decode(&self, raw: &EvmFilteredBlock) -> Result<DecodedBlock, DecodeError> {
        let block_number = raw.block.to_u64()?;
        let timestamp = raw.timestamp.to_datetime()?;

        let (pairs, diff) = self.reconcile(raw, block_number)?;

        if let Some(d) = &diff {
            match self.diff_policy {
                DiffPolicy::Ignore => {}
                DiffPolicy::Warn => {
                    warn!(
                        block = block_number,
                        tx_only = d.tx_only.len(),
                        receipt_only = d.receipt_only.len(),
                        "transaction and receipt sets diverge, decoding the intersection"
                    );
                }
                DiffPolicy::Reject => {
                    return Err(DecodeError::TxReceiptMismatch {
                        tx_only: d.tx_only.len(),
                        receipt_only: d.receipt_only.len(),
                    });
                }
            }
        }

        let mut transactions = BTreeMap::new();
        let mut dropped = Vec::new();
        for (tx, receipt) in pairs {
            match self.tx_decoder.decode(tx, receipt) {
                Ok(decoded) => {
                    transactions.insert(tx.hash.as_str().to_string(), decoded);
                }
                Err(e) => {
                    warn!(block = block_number, tx = %tx.hash, error = %e, "transaction decode failed, dropping");
                    dropped.push((tx.hash.clone(), e.to_string()));
                }
            }
        }

        Ok(DecodedBlock {
            block: Block {
                block_number,
                timestamp,
                transactions,
            },
            diff,
            dropped,
        })
    }
}
