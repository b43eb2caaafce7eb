//! 0x-prefixed hex string primitives.
//!
//! The raw export format carries every numeric and byte field as a hex
//! string. These newtypes keep the wire representation intact; the conversion
//! helpers produce native values at decode time.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::DecodeError;

/// A hex-encoded value with a `0x` prefix, variable length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexStr(pub String);

impl HexStr {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for an empty payload (`""` or a bare `"0x"`).
    pub fn is_empty_data(&self) -> bool {
        self.0.is_empty() || self.0 == "0x"
    }

    /// Decode the hex payload (after the `0x` prefix) into raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        let digits = self.0.strip_prefix("0x").unwrap_or(&self.0);
        hex::decode(digits).map_err(|e| DecodeError::InvalidHex {
            value: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for HexStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A hex-encoded integer with a `0x` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexInt(pub String);

impl HexInt {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_u64(&self) -> Result<u64, DecodeError> {
        hex_to_u64(&self.0)
    }

    /// Strict boolean decode: `0x1` is true, `0x0` is false, anything else
    /// is an error.
    pub fn to_bool(&self) -> Result<bool, DecodeError> {
        hex_to_bool(&self.0)
    }

    /// Interpret the value as a Unix timestamp (seconds, UTC).
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, DecodeError> {
        hex_to_datetime(&self.0)
    }
}

impl fmt::Display for HexInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 20-byte hex address with a `0x` prefix, lowercase-normalised on
/// construction and on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EvmAddress(String);

impl EvmAddress {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for EvmAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 32-byte hex hash with a `0x` prefix (tx hash, block hash, topic).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct EvmHash(pub String);

impl EvmHash {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvmHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Conversion helpers ───────────────────────────────────────────────────────

/// Parse a hex-encoded string (with or without `0x`) to u64.
pub fn hex_to_u64(s: &str) -> Result<u64, DecodeError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| DecodeError::InvalidHex {
        value: s.to_string(),
        reason: e.to_string(),
    })
}

/// Strict boolean decode of a receipt status: `0x1` → true, `0x0` → false.
pub fn hex_to_bool(s: &str) -> Result<bool, DecodeError> {
    match s {
        "0x0" => Ok(false),
        "0x1" => Ok(true),
        other => Err(DecodeError::InvalidHex {
            value: other.to_string(),
            reason: "expected 0x0 or 0x1".to_string(),
        }),
    }
}

/// Convert a hex-encoded Unix timestamp to a UTC datetime.
pub fn hex_to_datetime(s: &str) -> Result<DateTime<Utc>, DecodeError> {
    let secs = hex_to_u64(s)? as i64;
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| DecodeError::InvalidHex {
            value: s.to_string(),
            reason: "timestamp out of range".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_lowercased_on_new() {
        let addr = EvmAddress::new("0xA0b86991C6218b36c1d19D4a2e9Eb0cE3606eB48");
        assert_eq!(addr.as_str(), "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");
    }

    #[test]
    fn address_lowercased_on_deserialize() {
        let addr: EvmAddress =
            serde_json::from_str("\"0xABCDEF0000000000000000000000000000000000\"").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0000000000000000000000000000000000");
    }

    #[test]
    fn hex_to_u64_basic() {
        assert_eq!(hex_to_u64("0x1").unwrap(), 1);
        assert_eq!(hex_to_u64("0xff").unwrap(), 255);
        assert!(hex_to_u64("0xzz").is_err());
    }

    #[test]
    fn hex_to_bool_strict() {
        assert!(!hex_to_bool("0x0").unwrap());
        assert!(hex_to_bool("0x1").unwrap());
        assert!(hex_to_bool("0x2").is_err());
        assert!(hex_to_bool("0x01").is_err());
    }

    #[test]
    fn empty_data_detection() {
        assert!(HexStr::new("0x").is_empty_data());
        assert!(HexStr::new("").is_empty_data());
        assert!(!HexStr::new("0xa9059cbb").is_empty_data());
    }

    #[test]
    fn hex_timestamp_to_datetime() {
        // 0x66a2a3c1 = 1721934785
        let dt = hex_to_datetime("0x66a2a3c1").unwrap();
        assert_eq!(dt.timestamp(), 1_721_934_785);
    }

    #[test]
    fn hex_str_to_bytes() {
        let bytes = HexStr::new("0xa9059cbb").to_bytes().unwrap();
        assert_eq!(bytes, vec![0xa9, 0x05, 0x9c, 0xbb]);
        assert!(HexStr::new("0xabc").to_bytes().is_err());
    }
}
