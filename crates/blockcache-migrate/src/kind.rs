use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Semantic category of a cache directory.
///
/// Decides which files are looked at and how each one is migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CacheKind {
    #[serde(rename = "names")]
    Names,
    #[serde(rename = "recons", alias = "reconciliations")]
    Reconciliations,
    #[serde(rename = "abis")]
    Abis,
    /// Cached account state.
    #[serde(rename = "slurps")]
    Slurps,
    #[serde(rename = "txs", alias = "transactions")]
    Transactions,
    #[serde(rename = "blocks")]
    Blocks,
    #[serde(rename = "traces")]
    Traces,
}

impl CacheKind {
    pub const ALL: [CacheKind; 7] = [
        CacheKind::Names,
        CacheKind::Reconciliations,
        CacheKind::Abis,
        CacheKind::Slurps,
        CacheKind::Transactions,
        CacheKind::Blocks,
        CacheKind::Traces,
    ];

    /// Directory name under the cache root.
    pub fn dir_name(self) -> &'static str {
        match self {
            CacheKind::Names => "names",
            CacheKind::Reconciliations => "recons",
            CacheKind::Abis => "abis",
            CacheKind::Slurps => "slurps",
            CacheKind::Transactions => "txs",
            CacheKind::Blocks => "blocks",
            CacheKind::Traces => "traces",
        }
    }

    /// Kinds whose archives hold a record sequence. These use the array
    /// upgrade-detection rule.
    pub fn is_array_style(self) -> bool {
        matches!(
            self,
            CacheKind::Names | CacheKind::Reconciliations | CacheKind::Traces
        )
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cache kind `{0}` (expected one of names, recons, abis, slurps, txs, blocks, traces)")]
pub struct ParseCacheKindError(String);

impl FromStr for CacheKind {
    type Err = ParseCacheKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "names" => Ok(CacheKind::Names),
            "recons" | "reconciliations" => Ok(CacheKind::Reconciliations),
            "abis" => Ok(CacheKind::Abis),
            "slurps" => Ok(CacheKind::Slurps),
            "txs" | "transactions" => Ok(CacheKind::Transactions),
            "blocks" => Ok(CacheKind::Blocks),
            "traces" => Ok(CacheKind::Traces),
            _ => Err(ParseCacheKindError(s.to_string())),
        }
    }
}
