//! Raw-block payload validation — the sole gate before decoding.

use chainingest_core::error::ValidationError;
use chainingest_core::evm::EvmFilteredBlock;

/// Validates a raw byte payload against the block wire schema.
#[derive(Debug, Default, Clone)]
pub struct BlockValidator;

impl BlockValidator {
    pub fn new() -> Self {
        Self
    }

    /// Parse `data` as an [`EvmFilteredBlock`].
    ///
    /// Any structural or type mismatch yields a [`ValidationError`] carrying
    /// the human-readable reason; no partially-parsed block is ever returned.
    pub fn validate(&self, data: &[u8]) -> Result<EvmFilteredBlock, ValidationError> {
        serde_json::from_slice(data).map_err(|e| ValidationError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_payload_parses() {
        let payload = r#"{
            "block": "0x64",
            "timestamp": "0x66a2a3c1",
            "transactions": [],
            "receipts": []
        }"#;
        let block = BlockValidator::new().validate(payload.as_bytes()).unwrap();
        assert_eq!(block.block.to_u64().unwrap(), 100);
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn garbage_payload_fails_with_reason() {
        let err = BlockValidator::new().validate(b"not json").unwrap_err();
        assert!(!err.reason.is_empty());
    }

    #[test]
    fn missing_field_fails() {
        let payload = r#"{"block": "0x64", "timestamp": "0x0", "transactions": []}"#;
        let err = BlockValidator::new().validate(payload.as_bytes()).unwrap_err();
        assert!(err.reason.contains("receipts"));
    }

    #[test]
    fn wrong_type_fails() {
        let payload = r#"{"block": 100, "timestamp": "0x0", "transactions": [], "receipts": []}"#;
        assert!(BlockValidator::new().validate(payload.as_bytes()).is_err());
    }
}
