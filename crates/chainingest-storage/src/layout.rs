//! Block path layout: prefixes, templates, and the ordered block-number
//! parsers.
//!
//! Raw exports accumulated several naming conventions over time. Extraction
//! runs an ordered list of [`PathScheme`] parsers, most to least specific,
//! and fails with [`PathError`] when none match.

use serde::{Deserialize, Serialize};

use chainingest_core::error::PathError;

/// Classification of an object path by configured prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Raw,
    Decoded,
    Unknown,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Raw => "raw",
            FileType::Decoded => "decoded",
            FileType::Unknown => "unknown",
        }
    }
}

/// One naming convention for raw block files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathScheme {
    /// `<stem>_NNNNNNNNNNNN-NNNNNNNNNNNN.json` — zero-padded start-end pair
    /// (single-block exports repeat the number).
    RangeSuffix,
    /// `<stem>_<n>.json`
    NumberSuffix,
    /// `<n>.json`
    BareNumber,
}

impl PathScheme {
    /// Try to extract a block number from a file name (no directory part).
    fn parse(&self, file_name: &str) -> Option<u64> {
        let stem = file_name.strip_suffix(".json")?;
        match self {
            PathScheme::RangeSuffix => {
                let range = stem.rsplit('_').next()?;
                let (start, end) = range.split_once('-')?;
                if start.is_empty() || !all_digits(start) || !all_digits(end) {
                    return None;
                }
                start.parse().ok()
            }
            PathScheme::NumberSuffix => {
                let tail = stem.rsplit('_').next()?;
                // A bare `_` split returning the whole stem means no separator
                if tail.len() == stem.len() || !all_digits(tail) {
                    return None;
                }
                tail.parse().ok()
            }
            PathScheme::BareNumber => {
                if stem.is_empty() || !all_digits(stem) {
                    return None;
                }
                stem.parse().ok()
            }
        }
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Path templates for the raw and decoded sides of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockLayout {
    /// Prefix for raw inputs, e.g. `"raw/"`.
    pub raw_prefix: String,
    /// Prefix for decoded artifacts, e.g. `"decoded/"`.
    pub decoded_prefix: String,
    /// File-name stem for newly built raw paths.
    pub raw_stem: String,
    /// Ordered parsers, most to least specific.
    pub schemes: Vec<PathScheme>,
}

impl BlockLayout {
    pub fn new(
        raw_prefix: impl Into<String>,
        decoded_prefix: impl Into<String>,
        raw_stem: impl Into<String>,
    ) -> Self {
        Self {
            raw_prefix: raw_prefix.into(),
            decoded_prefix: decoded_prefix.into(),
            raw_stem: raw_stem.into(),
            schemes: vec![
                PathScheme::RangeSuffix,
                PathScheme::NumberSuffix,
                PathScheme::BareNumber,
            ],
        }
    }

    pub fn with_schemes(mut self, schemes: Vec<PathScheme>) -> Self {
        self.schemes = schemes;
        self
    }

    /// Extract the block number from an object path.
    pub fn block_number(&self, path: &str) -> Result<u64, PathError> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        self.schemes
            .iter()
            .find_map(|scheme| scheme.parse(file_name))
            .ok_or_else(|| PathError::new(path))
    }

    /// Render the raw path for a block number using the configured stem.
    pub fn raw_path(&self, block_number: u64) -> String {
        format!(
            "{}{}_{:012}-{:012}.json",
            self.raw_prefix, self.raw_stem, block_number, block_number
        )
    }

    /// Path of the decoded artifact for a block number.
    pub fn decoded_path(&self, block_number: u64) -> String {
        format!("{}{}.json", self.decoded_prefix, block_number)
    }

    /// Classify a path by prefix.
    pub fn classify(&self, path: &str) -> FileType {
        if path.starts_with(&self.raw_prefix) {
            FileType::Raw
        } else if path.starts_with(&self.decoded_prefix) {
            FileType::Decoded
        } else {
            FileType::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> BlockLayout {
        BlockLayout::new("raw/", "decoded/", "quicknode_avalanche-mainnet_block_with_receipts")
    }

    #[test]
    fn range_suffix_parses() {
        let n = layout()
            .block_number("raw/quicknode_avalanche-mainnet_block_with_receipts_000049381222-000049381222.json")
            .unwrap();
        assert_eq!(n, 49_381_222);
    }

    #[test]
    fn number_suffix_parses() {
        let n = layout().block_number("raw/block_49381222.json").unwrap();
        assert_eq!(n, 49_381_222);
    }

    #[test]
    fn bare_number_parses() {
        assert_eq!(layout().block_number("decoded/49381222.json").unwrap(), 49_381_222);
    }

    #[test]
    fn most_specific_scheme_wins() {
        // Both RangeSuffix and NumberSuffix could claim this name; the range
        // parser runs first and takes the pair's start.
        let n = layout()
            .block_number("raw/export_000000000007-000000000007.json")
            .unwrap();
        assert_eq!(n, 7);
    }

    #[test]
    fn unmatched_path_is_an_error() {
        assert!(layout().block_number("raw/readme.txt").is_err());
        assert!(layout().block_number("raw/block_abc.json").is_err());
    }

    #[test]
    fn raw_path_round_trips_through_parser() {
        let l = layout();
        let path = l.raw_path(49_381_222);
        assert_eq!(
            path,
            "raw/quicknode_avalanche-mainnet_block_with_receipts_000049381222-000049381222.json"
        );
        assert_eq!(l.block_number(&path).unwrap(), 49_381_222);
    }

    #[test]
    fn classify_by_prefix() {
        let l = layout();
        assert_eq!(l.classify("raw/x.json"), FileType::Raw);
        assert_eq!(l.classify("decoded/5.json"), FileType::Decoded);
        assert_eq!(l.classify("other/5.json"), FileType::Unknown);
    }

    #[test]
    fn scheme_order_is_configurable() {
        let l = layout().with_schemes(vec![PathScheme::BareNumber]);
        assert!(l.block_number("raw/block_5.json").is_err());
        assert_eq!(l.block_number("raw/5.json").unwrap(), 5);
    }
}
