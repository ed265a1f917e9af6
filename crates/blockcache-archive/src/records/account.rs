use serde::{Deserialize, Serialize};

use super::{upgrade_many, upgrade_one, Address, LegacyLayout, Record};
use crate::codec;
use crate::error::ArchiveError;
use crate::header::{FormatVersion, RecordKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Appearance {
    pub block_number: u64,
    pub transaction_index: u32,
}

/// Every appearance of an account found by a slurp, plus the last block
/// scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAccount {
    pub address: Address,
    pub last_block: u64,
    pub appearances: Vec<Appearance>,
}

/// Version 1 used 32-bit block numbers and stored appearances as tuples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAccountV1 {
    pub address: Address,
    pub last_block: u32,
    pub appearances: Vec<(u32, u32)>,
}

impl LegacyLayout for CachedAccountV1 {
    type Current = CachedAccount;
    const VERSION: FormatVersion = FormatVersion::V1;
}

impl From<CachedAccountV1> for CachedAccount {
    fn from(old: CachedAccountV1) -> Self {
        CachedAccount {
            address: old.address,
            last_block: u64::from(old.last_block),
            appearances: old
                .appearances
                .into_iter()
                .map(|(block_number, transaction_index)| Appearance {
                    block_number: u64::from(block_number),
                    transaction_index,
                })
                .collect(),
        }
    }
}

impl Record for CachedAccount {
    const KIND: RecordKind = RecordKind::CachedAccount;

    fn decode_one(version: FormatVersion, payload: &[u8]) -> Result<Self, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_one::<CachedAccountV1, Self>(version, payload),
            FormatVersion::V2 | FormatVersion::V3 => codec::deserialize(payload),
        }
    }

    fn decode_many(version: FormatVersion, payload: &[u8]) -> Result<Vec<Self>, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_many::<CachedAccountV1, Self>(version, payload),
            FormatVersion::V2 | FormatVersion::V3 => codec::deserialize(payload),
        }
    }
}
