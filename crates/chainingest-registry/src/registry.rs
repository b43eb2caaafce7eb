//! Contract registry loading and lookup.

use alloy_json_abi::JsonAbi;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use chainingest_core::error::RegistryError;
use chainingest_core::types::EvmAddress;

/// Per-contract metadata as it appears in `contracts.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub name: String,
    pub protocol: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Implementation address for proxy contracts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<EvmAddress>,
}

/// The on-disk shape of a per-address ABI file:
/// `{ "address": "0x…", "abi": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct AbiFile {
    pub address: EvmAddress,
    pub abi: serde_json::Value,
}

/// A fully loaded registry entry.
#[derive(Debug, Clone)]
pub struct ContractEntry {
    pub metadata: ContractMetadata,
    pub abi: JsonAbi,
}

/// Address → (metadata, ABI) registry, keyed by lowercase address.
///
/// Built once at startup. A malformed or missing top-level contracts file is
/// fatal; a malformed or missing per-entry metadata/ABI file is logged and
/// skipped so one bad contract never blocks the load.
pub struct ContractRegistry {
    contracts: HashMap<String, ContractEntry>,
}

impl ContractRegistry {
    /// Load the registry from `contracts_file` and the ABI directory.
    ///
    /// `contracts_file` maps category → address → metadata; the ABI for each
    /// address is expected at `<abi_dir>/<category>/<address>.json`.
    pub fn load(contracts_file: &Path, abi_dir: &Path) -> Result<Self, RegistryError> {
        info!(path = %contracts_file.display(), "Loading contract registry");

        let raw = std::fs::read_to_string(contracts_file).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RegistryError::FileNotFound {
                    path: contracts_file.display().to_string(),
                }
            } else {
                RegistryError::Io(e)
            }
        })?;

        let categories: HashMap<String, HashMap<String, serde_json::Value>> =
            serde_json::from_str(&raw).map_err(|e| RegistryError::InvalidJson {
                path: contracts_file.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut contracts = HashMap::new();
        let mut loaded = 0usize;
        let mut errors = 0usize;

        for (category, entries) in &categories {
            for (address, metadata_value) in entries {
                let address = address.to_ascii_lowercase();

                let metadata: ContractMetadata =
                    match serde_json::from_value(metadata_value.clone()) {
                        Ok(m) => m,
                        Err(e) => {
                            warn!(%address, error = %e, "Invalid contract metadata, skipping");
                            errors += 1;
                            continue;
                        }
                    };

                let abi_path = abi_dir.join(category).join(format!("{address}.json"));
                debug!(%address, name = %metadata.name, path = %abi_path.display(), "Loading ABI");

                let abi_raw = match std::fs::read_to_string(&abi_path) {
                    Ok(s) => s,
                    Err(_) => {
                        warn!(%address, path = %abi_path.display(), "No ABI file found, skipping");
                        errors += 1;
                        continue;
                    }
                };

                let abi_file: AbiFile = match serde_json::from_str(&abi_raw) {
                    Ok(f) => f,
                    Err(e) => {
                        warn!(%address, error = %e, "Invalid ABI file format, skipping");
                        errors += 1;
                        continue;
                    }
                };

                let abi: JsonAbi = match serde_json::from_value(abi_file.abi) {
                    Ok(a) => a,
                    Err(e) => {
                        warn!(%address, error = %e, "Invalid ABI format, skipping");
                        errors += 1;
                        continue;
                    }
                };

                contracts.insert(address, ContractEntry { metadata, abi });
                loaded += 1;
            }
        }

        info!(loaded, errors, "Contract registry loaded");
        Ok(Self { contracts })
    }

    /// Build a registry directly from entries (tests, embedded use).
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ContractEntry)>) -> Self {
        let contracts = entries
            .into_iter()
            .map(|(addr, entry)| (addr.to_ascii_lowercase(), entry))
            .collect();
        Self { contracts }
    }

    /// Full contract entry by address (case-insensitive).
    pub fn get(&self, address: &str) -> Option<&ContractEntry> {
        self.contracts.get(&address.to_ascii_lowercase())
    }

    /// Contract ABI by address (case-insensitive).
    pub fn get_abi(&self, address: &str) -> Option<&JsonAbi> {
        self.get(address).map(|entry| &entry.abi)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// All registered addresses (lowercase), sorted.
    pub fn addresses(&self) -> Vec<&str> {
        let mut addrs: Vec<&str> = self.contracts.keys().map(String::as_str).collect();
        addrs.sort_unstable();
        addrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

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
        }
    ]"#;

    const TOKEN_ADDR: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    fn write_fixture(dir: &TempDir, contracts_json: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let contracts_file = dir.path().join("contracts.json");
        fs::write(&contracts_file, contracts_json).unwrap();

        let abi_dir = dir.path().join("abis");
        fs::create_dir_all(abi_dir.join("tokens")).unwrap();
        fs::write(
            abi_dir.join("tokens").join(format!("{TOKEN_ADDR}.json")),
            format!(r#"{{"address": "{TOKEN_ADDR}", "abi": {ERC20_ABI}}}"#),
        )
        .unwrap();

        (contracts_file, abi_dir)
    }

    fn token_metadata() -> String {
        r#"{"name": "USDC", "protocol": "circle", "type": "erc20"}"#.to_string()
    }

    #[test]
    fn load_and_lookup() {
        let dir = TempDir::new().unwrap();
        let contracts_json = format!(r#"{{"tokens": {{"{TOKEN_ADDR}": {}}}}}"#, token_metadata());
        let (contracts_file, abi_dir) = write_fixture(&dir, &contracts_json);

        let registry = ContractRegistry::load(&contracts_file, &abi_dir).unwrap();
        assert_eq!(registry.len(), 1);

        let entry = registry.get(TOKEN_ADDR).unwrap();
        assert_eq!(entry.metadata.name, "USDC");
        assert!(registry.get_abi(TOKEN_ADDR).unwrap().functions().any(|f| f.name == "transfer"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let contracts_json = format!(r#"{{"tokens": {{"{TOKEN_ADDR}": {}}}}}"#, token_metadata());
        let (contracts_file, abi_dir) = write_fixture(&dir, &contracts_json);

        let registry = ContractRegistry::load(&contracts_file, &abi_dir).unwrap();
        assert!(registry.get(&TOKEN_ADDR.to_ascii_uppercase().replace("0X", "0x")).is_some());
    }

    #[test]
    fn bad_entry_skipped_without_aborting() {
        let dir = TempDir::new().unwrap();
        // Second address has no ABI file on disk, third has broken metadata.
        let contracts_json = format!(
            r#"{{"tokens": {{
                "{TOKEN_ADDR}": {},
                "0x2222222222222222222222222222222222222222": {{"name": "Ghost", "protocol": "x", "type": "erc20"}},
                "0x3333333333333333333333333333333333333333": {{"name": 42}}
            }}}}"#,
            token_metadata()
        );
        let (contracts_file, abi_dir) = write_fixture(&dir, &contracts_json);

        let registry = ContractRegistry::load(&contracts_file, &abi_dir).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("0x2222222222222222222222222222222222222222").is_none());
    }

    #[test]
    fn missing_top_level_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = ContractRegistry::load(&dir.path().join("nope.json"), dir.path());
        assert!(matches!(result, Err(RegistryError::FileNotFound { .. })));
    }

    #[test]
    fn corrupt_top_level_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let contracts_file = dir.path().join("contracts.json");
        fs::write(&contracts_file, "not json at all").unwrap();
        let result = ContractRegistry::load(&contracts_file, dir.path());
        assert!(matches!(result, Err(RegistryError::InvalidJson { .. })));
    }
}
