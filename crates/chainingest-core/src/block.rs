//! The decoded block model — the output side of the pipeline.
//!
//! Every method and log is exactly one of {decoded, encoded}: decoding either
//! produced names and typed arguments via a registered ABI, or the raw bytes
//! are carried through untouched. The maps use ordered keys so the persisted
//! artifact serializes byte-identically across runs.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{EvmAddress, EvmHash, HexStr};

/// A function call decoded through a registered ABI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedMethod {
    /// First 4 bytes of the calldata, hex-encoded.
    pub selector: HexStr,
    /// Function name from the ABI, e.g. `"transfer"`.
    pub name: String,
    /// Decoded inputs in ABI declaration order.
    pub args: IndexMap<String, serde_json::Value>,
}

/// A function call kept in its raw encoded form (unknown destination, empty
/// input, or a failed decode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedMethod {
    pub data: HexStr,
}

/// The function field of a decoded transaction — exactly one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Method {
    Decoded(DecodedMethod),
    Encoded(EncodedMethod),
}

impl Method {
    pub fn is_decoded(&self) -> bool {
        matches!(self, Method::Decoded(_))
    }
}

/// An event log decoded through a registered ABI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedLog {
    pub index: u64,
    pub removed: bool,
    pub contract: EvmAddress,
    /// topics[0] — the event signature hash.
    pub signature: EvmHash,
    /// Event name from the ABI, e.g. `"Transfer"`.
    pub name: String,
    /// Decoded parameters in ABI declaration order.
    pub attributes: IndexMap<String, serde_json::Value>,
}

/// An event log kept in its raw encoded form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedLog {
    pub index: u64,
    pub removed: bool,
    pub contract: EvmAddress,
    pub signature: EvmHash,
    pub topics: Vec<EvmHash>,
    pub data: HexStr,
}

/// One entry in a transaction's log map — exactly one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEntry {
    Decoded(DecodedLog),
    Encoded(EncodedLog),
}

impl LogEntry {
    pub fn is_decoded(&self) -> bool {
        matches!(self, LogEntry::Decoded(_))
    }
}

/// Unique id for a log within a block: `"{tx_hash}_{log_index}"`.
pub fn log_id(tx_hash: &EvmHash, index: u64) -> String {
    format!("{}_{}", tx_hash, index)
}

/// A reconciled, decoded transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_hash: EvmHash,
    /// Position within the block.
    pub index: u64,
    pub origin_from: EvmAddress,
    /// `None` for contract-creation transactions.
    pub origin_to: Option<EvmAddress>,
    pub function: Method,
    /// Receipt status: `0x1` → true, `0x0` → false.
    pub tx_success: bool,
    /// log id → decoded or encoded log.
    pub logs: BTreeMap<String, LogEntry>,
}

/// A fully decoded block — the persisted artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub block_number: u64,
    /// Block timestamp, serialized as ISO-8601.
    pub timestamp: DateTime<Utc>,
    /// tx hash → decoded transaction.
    pub transactions: BTreeMap<String, Transaction>,
}

impl Block {
    pub fn transaction(&self, hash: &str) -> Option<&Transaction> {
        self.transactions.get(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded_method(data: &str) -> Method {
        Method::Encoded(EncodedMethod {
            data: HexStr::new(data),
        })
    }

    #[test]
    fn method_serde_tag() {
        let m = encoded_method("0x");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["type"], "encoded");
        assert_eq!(json["data"], "0x");

        let back: Method = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn decoded_method_round_trip() {
        let mut args = IndexMap::new();
        args.insert("to".to_string(), serde_json::json!("0xabc"));
        args.insert("amount".to_string(), serde_json::json!("1000000"));
        let m = Method::Decoded(DecodedMethod {
            selector: HexStr::new("0xa9059cbb"),
            name: "transfer".to_string(),
            args,
        });
        let json = serde_json::to_string(&m).unwrap();
        // args keep ABI declaration order
        assert!(json.find("\"to\"").unwrap() < json.find("\"amount\"").unwrap());
        let back: Method = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn log_id_format() {
        let id = log_id(&EvmHash::new("0xabc"), 7);
        assert_eq!(id, "0xabc_7");
    }

    #[test]
    fn block_serialization_is_ordered() {
        let tx = |hash: &str| Transaction {
            tx_hash: EvmHash::new(hash),
            index: 0,
            origin_from: EvmAddress::new("0x1111111111111111111111111111111111111111"),
            origin_to: None,
            function: encoded_method("0x"),
            tx_success: true,
            logs: BTreeMap::new(),
        };

        let mut a = BTreeMap::new();
        a.insert("0xbb".to_string(), tx("0xbb"));
        a.insert("0xaa".to_string(), tx("0xaa"));

        let mut b = BTreeMap::new();
        b.insert("0xaa".to_string(), tx("0xaa"));
        b.insert("0xbb".to_string(), tx("0xbb"));

        let ts = DateTime::from_timestamp(1_721_934_785, 0).unwrap();
        let block_a = Block { block_number: 1, timestamp: ts, transactions: a };
        let block_b = Block { block_number: 1, timestamp: ts, transactions: b };

        assert_eq!(
            serde_json::to_string(&block_a).unwrap(),
            serde_json::to_string(&block_b).unwrap()
        );
    }
}
