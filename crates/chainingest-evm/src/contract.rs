//! `ContractCodec` — one ABI-bound decode handle per contract.
//!
//! Pre-indexes an ABI for O(1) dispatch: 4-byte selector → function,
//! topic[0] (event selector) → event. The codec exposes exactly two decode
//! capabilities — function calldata and event logs — so any ABI library can
//! back it.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;
use alloy_json_abi::{Event, Function, JsonAbi, Param};
use alloy_primitives::B256;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;

use chainingest_core::error::DecodeError;

use crate::normalizer;

/// A decoded function call: selector, name, and inputs in declaration order.
#[derive(Debug, Clone)]
pub struct DecodedFunction {
    /// 0x-prefixed 4-byte selector.
    pub selector: String,
    pub name: String,
    pub args: IndexMap<String, Value>,
}

/// A decoded event: name and parameters in declaration order.
#[derive(Debug, Clone)]
pub struct DecodedEventData {
    pub name: String,
    pub attributes: IndexMap<String, Value>,
}

/// An immutable, ABI-bound decode handle for a single contract.
pub struct ContractCodec {
    name: String,
    /// selector → function definition
    functions: HashMap<[u8; 4], Function>,
    /// keccak256(event signature) → event definition (anonymous events are
    /// not addressable by topic and are skipped)
    events: HashMap<B256, Event>,
}

impl ContractCodec {
    pub fn new(name: impl Into<String>, abi: &JsonAbi) -> Self {
        let functions = abi
            .functions()
            .map(|f| (f.selector().0, f.clone()))
            .collect();
        let events = abi
            .events()
            .filter(|e| !e.anonymous)
            .map(|e| (e.selector(), e.clone()))
            .collect();
        Self {
            name: name.into(),
            functions,
            events,
        }
    }

    /// Contract name from the registry metadata.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decode function calldata (4-byte selector + ABI-encoded inputs).
    pub fn decode_function(&self, calldata: &[u8]) -> Result<DecodedFunction, DecodeError> {
        if calldata.len() < 4 {
            return Err(DecodeError::AbiDecodeFailed {
                reason: format!(
                    "calldata too short: {} bytes (need at least 4 for selector)",
                    calldata.len()
                ),
            });
        }

        let selector: [u8; 4] = calldata[..4].try_into().unwrap();
        let func = self.functions.get(&selector).ok_or_else(|| {
            DecodeError::SelectorNotFound {
                selector: format!("0x{}", hex::encode(selector)),
            }
        })?;

        let (names, types) = resolve_params(&func.inputs)?;
        let args = decode_params(&calldata[4..], &types, &names)?;

        Ok(DecodedFunction {
            selector: format!("0x{}", hex::encode(selector)),
            name: func.name.clone(),
            args,
        })
    }

    /// Decode an event log from its topics and data payload.
    ///
    /// Returns `Ok(None)` when the log's topic[0] matches no event in this
    /// ABI — the caller keeps the encoded form.
    pub fn decode_event(
        &self,
        topics: &[String],
        data: &[u8],
    ) -> Result<Option<DecodedEventData>, DecodeError> {
        let Some(topic0) = topics.first() else {
            return Ok(None);
        };
        let sig: B256 = topic0.parse().map_err(|_| DecodeError::InvalidHex {
            value: topic0.clone(),
            reason: "expected a 32-byte hex topic".to_string(),
        })?;
        let Some(event) = self.events.get(&sig) else {
            return Ok(None);
        };

        // Non-indexed params are ABI-encoded as a tuple in the data payload.
        let body_params: Vec<&alloy_json_abi::EventParam> =
            event.inputs.iter().filter(|p| !p.indexed).collect();
        let body_types: Vec<DynSolType> = body_params
            .iter()
            .map(|p| resolve_type(p.resolve()))
            .collect::<Result<_, _>>()?;

        let mut body_values = if body_types.is_empty() {
            Vec::new()
        } else {
            let tuple = DynSolType::Tuple(body_types);
            match tuple.abi_decode_params(data).map_err(|e| {
                DecodeError::AbiDecodeFailed {
                    reason: format!("event data decode: {e}"),
                }
            })? {
                DynSolValue::Tuple(vals) => vals,
                other => vec![other],
            }
        }
        .into_iter();

        // Walk declaration order, pulling indexed params from topics[1..] and
        // the rest from the decoded data tuple.
        let mut attributes = IndexMap::new();
        let mut topic_cursor = 1usize;
        for (i, param) in event.inputs.iter().enumerate() {
            let name = param_name(&param.name, i);
            if param.indexed {
                let topic = topics.get(topic_cursor).ok_or_else(|| {
                    DecodeError::AbiDecodeFailed {
                        reason: format!("missing topic for indexed param '{name}'"),
                    }
                })?;
                topic_cursor += 1;
                let ty = resolve_type(param.resolve())?;
                attributes.insert(name, decode_topic(topic, &ty)?);
            } else {
                let value = body_values.next().ok_or_else(|| {
                    DecodeError::AbiDecodeFailed {
                        reason: format!("missing data value for param '{name}'"),
                    }
                })?;
                attributes.insert(name, normalizer::normalize(value));
            }
        }

        Ok(Some(DecodedEventData {
            name: event.name.clone(),
            attributes,
        }))
    }
}

/// Decode a single indexed topic (always 32 bytes).
///
/// Value types (uint, int, bool, address, bytes1–32) are padded into the
/// topic and recoverable. Reference types (string, bytes, arrays, tuples)
/// are stored as the keccak256 of their encoding — the original value is
/// unrecoverable, so the raw 32-byte hash is kept as a hex string.
fn decode_topic(topic_hex: &str, ty: &DynSolType) -> Result<Value, DecodeError> {
    match ty {
        DynSolType::String
        | DynSolType::Bytes
        | DynSolType::Array(_)
        | DynSolType::FixedArray(..)
        | DynSolType::Tuple(_) => {
            return Ok(Value::String(topic_hex.to_string()));
        }
        _ => {}
    }

    let digits = topic_hex.strip_prefix("0x").unwrap_or(topic_hex);
    let bytes = hex::decode(digits).map_err(|e| DecodeError::InvalidHex {
        value: topic_hex.to_string(),
        reason: e.to_string(),
    })?;

    let decoded = ty.abi_decode(&bytes).map_err(|e| DecodeError::AbiDecodeFailed {
        reason: format!("topic decode: {e}"),
    })?;
    Ok(normalizer::normalize(decoded))
}

/// Resolve ABI params into (names, DynSolTypes); unnamed params become `argN`.
fn resolve_params(params: &[Param]) -> Result<(Vec<String>, Vec<DynSolType>), DecodeError> {
    let mut names = Vec::with_capacity(params.len());
    let mut types = Vec::with_capacity(params.len());
    for (i, param) in params.iter().enumerate() {
        names.push(param_name(&param.name, i));
        types.push(resolve_type(param.resolve())?);
    }
    Ok((names, types))
}

fn param_name(name: &str, index: usize) -> String {
    if name.is_empty() {
        format!("arg{index}")
    } else {
        name.to_string()
    }
}

fn resolve_type(
    resolved: Result<DynSolType, alloy_dyn_abi::Error>,
) -> Result<DynSolType, DecodeError> {
    resolved.map_err(|e| DecodeError::AbiDecodeFailed {
        reason: format!("unresolvable ABI type: {e}"),
    })
}

/// ABI-decode a params tuple and pair values with names in order.
fn decode_params(
    data: &[u8],
    types: &[DynSolType],
    names: &[String],
) -> Result<IndexMap<String, Value>, DecodeError> {
    if types.is_empty() {
        return Ok(IndexMap::new());
    }

    let tuple = DynSolType::Tuple(types.to_vec());
    let decoded = tuple.abi_decode_params(data).map_err(|e| {
        DecodeError::AbiDecodeFailed {
            reason: format!("function input decode: {e}"),
        }
    })?;

    let values = match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    };

    Ok(names
        .iter()
        .cloned()
        .zip(values.into_iter().map(normalizer::normalize))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ERC20_ABI: &str = r#"[
        {
            "name": "transfer",
            "type": "function",
            "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ],
            "outputs": [{"name": "", "type": "bool"}],
            "stateMutability": "nonpayable"
        },
        {
            "name": "Transfer",
            "type": "event",
            "anonymous": false,
            "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ]
        }
    ]"#;

    const TRANSFER_TOPIC: &str =
        "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

    fn codec() -> ContractCodec {
        let abi: JsonAbi = serde_json::from_str(ERC20_ABI).unwrap();
        ContractCodec::new("USDC", &abi)
    }

    fn transfer_calldata() -> Vec<u8> {
        // transfer(to=0xd8dA…6045, amount=1000000)
        let mut calldata = hex::decode("a9059cbb").unwrap();
        calldata.extend(
            hex::decode("000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045")
                .unwrap(),
        );
        calldata.extend(
            hex::decode("00000000000000000000000000000000000000000000000000000000000f4240")
                .unwrap(),
        );
        calldata
    }

    #[test]
    fn decode_transfer_call() {
        let decoded = codec().decode_function(&transfer_calldata()).unwrap();
        assert_eq!(decoded.name, "transfer");
        assert_eq!(decoded.selector, "0xa9059cbb");
        assert_eq!(
            decoded.args["to"],
            serde_json::json!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045")
        );
        assert_eq!(decoded.args["amount"], serde_json::json!(1_000_000u64));
        // declaration order preserved
        let keys: Vec<_> = decoded.args.keys().collect();
        assert_eq!(keys, vec!["to", "amount"]);
    }

    #[test]
    fn unknown_selector_is_an_error() {
        let result = codec().decode_function(&hex::decode("deadbeef").unwrap());
        assert!(matches!(result, Err(DecodeError::SelectorNotFound { .. })));
    }

    #[test]
    fn short_calldata_is_an_error() {
        assert!(codec().decode_function(&[0xa9]).is_err());
    }

    #[test]
    fn decode_transfer_event() {
        let topics = vec![
            TRANSFER_TOPIC.to_string(),
            "0x000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045".to_string(),
            "0x000000000000000000000000ab5801a7d398351b8be11c439e05c5b3259aec9b".to_string(),
        ];
        // value = 1 ETH in wei
        let mut data = vec![0u8; 32];
        data[24..].copy_from_slice(&1_000_000_000_000_000_000u64.to_be_bytes());

        let decoded = codec().decode_event(&topics, &data).unwrap().unwrap();
        assert_eq!(decoded.name, "Transfer");
        assert_eq!(
            decoded.attributes["from"],
            serde_json::json!("0xd8da6bf26964af9d7eed9e03e53415d37aa96045")
        );
        assert_eq!(
            decoded.attributes["value"],
            serde_json::json!(1_000_000_000_000_000_000u64)
        );
        // declaration order: from, to, value
        let keys: Vec<_> = decoded.attributes.keys().collect();
        assert_eq!(keys, vec!["from", "to", "value"]);
    }

    #[test]
    fn unknown_event_topic_returns_none() {
        let topics = vec![format!("0x{}", "11".repeat(32))];
        let result = codec().decode_event(&topics, &[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn no_topics_returns_none() {
        assert!(codec().decode_event(&[], &[]).unwrap().is_none());
    }
}
