//! The raw block wire schema.
//!
//! Mirrors the JSON exported by the upstream block stream: one document per
//! block holding the block number, timestamp, full transaction objects, and
//! full receipt objects. Every numeric field arrives hex-encoded.

use serde::{Deserialize, Serialize};

use crate::types::{EvmAddress, EvmHash, HexInt, HexStr};

/// A single event log as carried inside a transaction receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmLog {
    pub address: EvmAddress,
    #[serde(rename = "blockHash")]
    pub block_hash: EvmHash,
    #[serde(rename = "blockNumber")]
    pub block_number: HexInt,
    pub data: HexStr,
    #[serde(rename = "logIndex")]
    pub log_index: HexInt,
    /// `false` unless the log was dropped by a reorg.
    pub removed: bool,
    pub topics: Vec<EvmHash>,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: EvmHash,
    #[serde(rename = "transactionIndex")]
    pub transaction_index: HexInt,
}

/// A transaction receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmTxReceipt {
    #[serde(rename = "blockHash")]
    pub block_hash: EvmHash,
    #[serde(rename = "blockNumber")]
    pub block_number: HexInt,
    /// Populated only for contract-creation transactions.
    #[serde(rename = "contractAddress")]
    pub contract_address: Option<EvmAddress>,
    #[serde(rename = "cumulativeGasUsed")]
    pub cumulative_gas_used: HexStr,
    #[serde(rename = "effectiveGasPrice")]
    pub effective_gas_price: HexStr,
    pub from: EvmAddress,
    #[serde(rename = "gasUsed")]
    pub gas_used: HexStr,
    pub logs: Vec<EvmLog>,
    #[serde(rename = "logsBloom")]
    pub logs_bloom: serde_json::Value,
    /// `0x1` on success, `0x0` on failure.
    pub status: HexInt,
    pub to: Option<EvmAddress>,
    #[serde(rename = "transactionHash")]
    pub transaction_hash: EvmHash,
    #[serde(rename = "transactionIndex")]
    pub transaction_index: HexInt,
    #[serde(rename = "type")]
    pub tx_type: HexStr,
}

/// A full transaction object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmTransaction {
    #[serde(rename = "accessList", default)]
    pub access_list: Option<serde_json::Value>,
    #[serde(rename = "blockHash")]
    pub block_hash: EvmHash,
    #[serde(rename = "blockNumber")]
    pub block_number: HexInt,
    #[serde(rename = "chainId", default)]
    pub chain_id: Option<HexInt>,
    pub from: EvmAddress,
    pub gas: HexStr,
    #[serde(rename = "gasPrice")]
    pub gas_price: HexStr,
    pub hash: EvmHash,
    pub input: HexStr,
    #[serde(rename = "maxFeePerGas", default)]
    pub max_fee_per_gas: Option<HexStr>,
    #[serde(rename = "maxPriorityFeePerGas", default)]
    pub max_priority_fee_per_gas: Option<HexStr>,
    pub nonce: HexInt,
    pub r: EvmHash,
    pub s: EvmHash,
    /// `None` for contract-creation transactions.
    pub to: Option<EvmAddress>,
    #[serde(rename = "transactionIndex")]
    pub transaction_index: HexInt,
    #[serde(rename = "type")]
    pub tx_type: HexInt,
    pub v: HexInt,
    pub value: HexInt,
}

/// The per-block export envelope: block number, timestamp, transactions, and
/// their receipts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmFilteredBlock {
    /// Block number, hex-encoded.
    pub block: HexInt,
    /// Unix timestamp, hex-encoded.
    pub timestamp: HexInt,
    pub transactions: Vec<EvmTransaction>,
    pub receipts: Vec<EvmTxReceipt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_wire_field_names() {
        let json = r#"{
            "address": "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            "blockHash": "0xaa",
            "blockNumber": "0x64",
            "data": "0x",
            "logIndex": "0x0",
            "removed": false,
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "transactionHash": "0xbb",
            "transactionIndex": "0x1"
        }"#;
        let log: EvmLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.log_index.to_u64().unwrap(), 0);
        // address is lowercased on the way in
        assert_eq!(log.address.as_str(), "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
        assert!(!log.removed);
    }

    #[test]
    fn transaction_missing_to_is_contract_creation() {
        let json = r#"{
            "blockHash": "0xaa",
            "blockNumber": "0x64",
            "from": "0x1111111111111111111111111111111111111111",
            "gas": "0x5208",
            "gasPrice": "0x3b9aca00",
            "hash": "0xcc",
            "input": "0x6080",
            "nonce": "0x1",
            "r": "0x0",
            "s": "0x0",
            "to": null,
            "transactionIndex": "0x0",
            "type": "0x0",
            "v": "0x1",
            "value": "0x0"
        }"#;
        let tx: EvmTransaction = serde_json::from_str(json).unwrap();
        assert!(tx.to.is_none());
        assert!(tx.chain_id.is_none());
    }
}
