//! Per-log decoding with graceful fallback to the encoded form.

use std::sync::Arc;
use tracing::debug;

use chainingest_core::block::{DecodedLog, EncodedLog, LogEntry};
use chainingest_core::error::DecodeError;
use chainingest_core::evm::EvmLog;
use chainingest_core::types::EvmHash;

use crate::manager::ContractManager;

/// Decodes a single log via the owning contract's ABI, or falls back to the
/// opaque encoded form. A decode failure never fails the transaction: the
/// original failure is emitted as a `debug!` diagnostic and the raw topics
/// and data are carried through.
pub struct LogDecoder {
    manager: Arc<ContractManager>,
}

impl LogDecoder {
    pub fn new(manager: Arc<ContractManager>) -> Self {
        Self { manager }
    }

    fn encoded(log: &EvmLog, index: u64) -> LogEntry {
        LogEntry::Encoded(EncodedLog {
            index,
            removed: log.removed,
            contract: log.address.clone(),
            signature: log.topics.first().cloned().unwrap_or_else(|| EvmHash::new("")),
            topics: log.topics.clone(),
            data: log.data.clone(),
        })
    }

    /// Decode one log. Only a malformed log index is a hard error — it makes
    /// the log unaddressable within the block.
    pub fn decode(&self, log: &EvmLog) -> Result<LogEntry, DecodeError> {
        let index = log.log_index.to_u64()?;

        if log.address.is_empty() {
            return Ok(Self::encoded(log, index));
        }
        let Some(codec) = self.manager.get(log.address.as_str()) else {
            return Ok(Self::encoded(log, index));
        };

        let data = match log.data.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(tx = %log.transaction_hash, index, error = %e, "log data is not valid hex, keeping encoded form");
                return Ok(Self::encoded(log, index));
            }
        };

        let topics: Vec<String> = log.topics.iter().map(|t| t.as_str().to_string()).collect();

        match codec.decode_event(&topics, &data) {
            Ok(Some(event)) => Ok(LogEntry::Decoded(DecodedLog {
                index,
                removed: log.removed,
                contract: log.address.clone(),
                signature: log.topics.first().cloned().unwrap_or_else(|| EvmHash::new("")),
                name: event.name,
                attributes: event.attributes,
            })),
            Ok(None) => Ok(Self::encoded(log, index)),
            Err(e) => {
                debug!(tx = %log.transaction_hash, index, error = %e, "log decode failed, keeping encoded form");
                Ok(Self::encoded(log, index))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainingest_core::types::{EvmAddress, HexInt, HexStr};
    use chainingest_registry::{ContractEntry, ContractMetadata, ContractRegistry};

    const ADDR: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    const TRANSFER_TOPIC: &str =
        "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

    fn decoder() -> LogDecoder {
        let abi: alloy_json_abi::JsonAbi = serde_json::from_str(
            r#"[{"name": "Transfer", "type": "event", "anonymous": false,
                 "inputs": [
                    {"name": "from", "type": "address", "indexed": true},
                    {"name": "to", "type": "address", "indexed": true},
                    {"name": "value", "type": "uint256", "indexed": false}
                 ]}]"#,
        )
        .unwrap();
        let registry = Arc::new(ContractRegistry::from_entries([(
            ADDR.to_string(),
            ContractEntry {
                metadata: ContractMetadata {
                    name: "USDC".into(),
                    protocol: "circle".into(),
                    kind: "erc20".into(),
                    description: None,
                    version: None,
                    implementation: None,
                },
                abi,
            },
        )]));
        LogDecoder::new(Arc::new(ContractManager::new(registry)))
    }

    fn transfer_log(address: &str) -> EvmLog {
        EvmLog {
            address: EvmAddress::new(address),
            block_hash: EvmHash::new("0xaa"),
            block_number: HexInt::new("0x64"),
            data: HexStr::new(format!("0x{:064x}", 1_000_000u64)),
            log_index: HexInt::new("0x2"),
            removed: false,
            topics: vec![
                EvmHash::new(TRANSFER_TOPIC),
                EvmHash::new("0x000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045"),
                EvmHash::new("0x000000000000000000000000ab5801a7d398351b8be11c439e05c5b3259aec9b"),
            ],
            transaction_hash: EvmHash::new("0xbb"),
            transaction_index: HexInt::new("0x0"),
        }
    }

    #[test]
    fn registered_contract_log_decodes() {
        let entry = decoder().decode(&transfer_log(ADDR)).unwrap();
        match entry {
            LogEntry::Decoded(log) => {
                assert_eq!(log.name, "Transfer");
                assert_eq!(log.index, 2);
                assert_eq!(log.attributes["value"], serde_json::json!(1_000_000u64));
            }
            LogEntry::Encoded(_) => panic!("expected decoded log"),
        }
    }

    #[test]
    fn unregistered_contract_falls_back_to_encoded() {
        let entry = decoder()
            .decode(&transfer_log("0x9999999999999999999999999999999999999999"))
            .unwrap();
        match entry {
            LogEntry::Encoded(log) => {
                assert_eq!(log.index, 2);
                assert_eq!(log.signature.as_str(), TRANSFER_TOPIC);
                assert_eq!(log.topics.len(), 3);
            }
            LogEntry::Decoded(_) => panic!("expected encoded log"),
        }
    }

    #[test]
    fn bad_log_data_degrades_to_encoded() {
        let mut log = transfer_log(ADDR);
        log.data = HexStr::new("0xzz");
        let entry = decoder().decode(&log).unwrap();
        assert!(!entry.is_decoded());
    }

    #[test]
    fn bad_log_index_is_hard_error() {
        let mut log = transfer_log(ADDR);
        log.log_index = HexInt::new("0xnope");
        assert!(decoder().decode(&log).is_err());
    }
}
