//! Per-transaction decoding: function calldata + receipt logs → `Transaction`.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use chainingest_core::block::{log_id, DecodedMethod, EncodedMethod, LogEntry, Method, Transaction};
use chainingest_core::error::DecodeError;
use chainingest_core::evm::{EvmTransaction, EvmTxReceipt};
use chainingest_core::types::HexStr;

use crate::log::LogDecoder;
use crate::manager::ContractManager;

/// Decodes one tx+receipt pair into a canonical [`Transaction`] record.
pub struct TransactionDecoder {
    manager: Arc<ContractManager>,
    log_decoder: LogDecoder,
}

impl TransactionDecoder {
    pub fn new(manager: Arc<ContractManager>) -> Self {
        Self {
            log_decoder: LogDecoder::new(manager.clone()),
            manager,
        }
    }

    /// Decode the function call carried in the transaction input.
    ///
    /// Unknown destination, contract creation, and empty input all classify
    /// as [`Method::Encoded`]; a decode failure degrades to the same with a
    /// diagnostic rather than propagating.
    pub fn decode_function(&self, tx: &EvmTransaction) -> Method {
        let encoded = || {
            Method::Encoded(EncodedMethod {
                data: tx.input.clone(),
            })
        };

        let Some(to) = &tx.to else {
            return encoded();
        };
        if tx.input.is_empty_data() {
            return encoded();
        }
        let Some(codec) = self.manager.get(to.as_str()) else {
            return encoded();
        };

        let calldata = match tx.input.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(tx = %tx.hash, error = %e, "calldata is not valid hex, keeping encoded form");
                return encoded();
            }
        };

        match codec.decode_function(&calldata) {
            Ok(call) => Method::Decoded(DecodedMethod {
                selector: HexStr::new(call.selector),
                name: call.name,
                args: call.args,
            }),
            Err(e) => {
                debug!(tx = %tx.hash, error = %e, "function decode failed, keeping encoded form");
                encoded()
            }
        }
    }

    /// Decode every log in the receipt, keyed by `"{tx_hash}_{log_index}"`.
    pub fn decode_receipt_logs(
        &self,
        receipt: &EvmTxReceipt,
    ) -> Result<BTreeMap<String, LogEntry>, DecodeError> {
        let mut logs = BTreeMap::new();
        for log in &receipt.logs {
            let index = log.log_index.to_u64()?;
            let entry = self.log_decoder.decode(log)?;
            logs.insert(log_id(&log.transaction_hash, index), entry);
        }
        Ok(logs)
    }

    /// Decode a reconciled tx+receipt pair.
    ///
    /// An error here (malformed index, malformed receipt status) drops only
    /// this transaction — the caller keeps decoding the rest of the block.
    pub fn decode(
        &self,
        tx: &EvmTransaction,
        receipt: &EvmTxReceipt,
    ) -> Result<Transaction, DecodeError> {
        let function = self.decode_function(tx);
        let logs = self.decode_receipt_logs(receipt)?;

        Ok(Transaction {
            tx_hash: tx.hash.clone(),
            index: tx.transaction_index.to_u64()?,
            origin_from: tx.from.clone(),
            origin_to: tx.to.clone(),
            function,
            tx_success: receipt.status.to_bool()?,
            logs,
        })
    }
}
