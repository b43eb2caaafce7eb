//! Converts alloy `DynSolValue` → JSON values for the decoded artifact.
//!
//! Hex and byte fields serialize as `0x`-prefixed strings, addresses are
//! lowercased, and integers that overflow a JSON-safe u64/i64 fall back to
//! decimal strings.

use alloy_core::dyn_abi::DynSolValue;
use serde_json::Value;

/// Convert a decoded `DynSolValue` into a JSON value.
pub fn normalize(val: DynSolValue) -> Value {
    match val {
        DynSolValue::Bool(b) => Value::Bool(b),

        DynSolValue::Int(i, _bits) => match i64::try_from(i) {
            Ok(v) => Value::from(v),
            Err(_) => Value::String(i.to_string()),
        },

        DynSolValue::Uint(u, _bits) => match u64::try_from(u) {
            Ok(v) => Value::from(v),
            Err(_) => Value::String(u.to_string()),
        },

        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..size])))
        }

        DynSolValue::Bytes(b) => Value::String(format!("0x{}", hex::encode(b))),

        DynSolValue::String(s) => Value::String(s),

        // Lowercase hex, matching the registry's address normalization
        DynSolValue::Address(a) => Value::String(format!("{a:#x}")),

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            Value::Array(vals.into_iter().map(normalize).collect())
        }

        DynSolValue::Tuple(fields) => {
            // Unnamed tuple fields get positional keys "0", "1", ...
            let map = fields
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), normalize(v)))
                .collect();
            Value::Object(map)
        }

        // Function selectors (address + selector packed) — keep as hex
        DynSolValue::Function(f) => Value::String(format!("0x{}", hex::encode(f.as_slice()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, I256, U256};

    #[test]
    fn normalize_bool() {
        assert_eq!(normalize(DynSolValue::Bool(true)), Value::Bool(true));
    }

    #[test]
    fn normalize_small_uint_is_number() {
        let v = normalize(DynSolValue::Uint(U256::from(1_000_000u64), 256));
        assert_eq!(v, Value::from(1_000_000u64));
    }

    #[test]
    fn normalize_large_uint_is_decimal_string() {
        // 2^128 does not fit in u64
        let big = U256::from(1u8) << 128;
        let v = normalize(DynSolValue::Uint(big, 256));
        assert_eq!(v, Value::String("340282366920938463463374607431768211456".into()));
    }

    #[test]
    fn normalize_negative_int() {
        let v = normalize(DynSolValue::Int(I256::try_from(-42i64).unwrap(), 256));
        assert_eq!(v, Value::from(-42i64));
    }

    #[test]
    fn normalize_address_is_lowercase_hex() {
        let addr: Address = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap();
        let v = normalize(DynSolValue::Address(addr));
        assert_eq!(
            v,
            Value::String("0xd8da6bf26964af9d7eed9e03e53415d37aa96045".into())
        );
    }

    #[test]
    fn normalize_bytes_is_hex_string() {
        let v = normalize(DynSolValue::Bytes(vec![0xde, 0xad]));
        assert_eq!(v, Value::String("0xdead".into()));
    }

    #[test]
    fn normalize_tuple_uses_positional_keys() {
        let v = normalize(DynSolValue::Tuple(vec![
            DynSolValue::Bool(true),
            DynSolValue::Uint(U256::from(7u8), 8),
        ]));
        assert_eq!(v["0"], Value::Bool(true));
        assert_eq!(v["1"], Value::from(7u64));
    }
}
