use serde::{Deserialize, Serialize};

use super::{upgrade_many, upgrade_one, Hash, LegacyLayout, Record};
use crate::codec;
use crate::error::ArchiveError;
use crate::header::{FormatVersion, RecordKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub timestamp: u64,
    pub transaction_hashes: Vec<Hash>,
    /// `None` for blocks cached before base fees were recorded.
    pub base_fee_per_gas: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockV1 {
    pub number: u32,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub timestamp: u32,
    pub transaction_hashes: Vec<Hash>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockV2 {
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub timestamp: u64,
    pub transaction_hashes: Vec<Hash>,
}

impl LegacyLayout for BlockV1 {
    type Current = Block;
    const VERSION: FormatVersion = FormatVersion::V1;
}

impl LegacyLayout for BlockV2 {
    type Current = Block;
    const VERSION: FormatVersion = FormatVersion::V2;
}

impl From<BlockV1> for BlockV2 {
    fn from(old: BlockV1) -> Self {
        BlockV2 {
            number: u64::from(old.number),
            hash: old.hash,
            parent_hash: old.parent_hash,
            timestamp: u64::from(old.timestamp),
            transaction_hashes: old.transaction_hashes,
        }
    }
}

impl From<BlockV2> for Block {
    fn from(old: BlockV2) -> Self {
        Block {
            number: old.number,
            hash: old.hash,
            parent_hash: old.parent_hash,
            timestamp: old.timestamp,
            transaction_hashes: old.transaction_hashes,
            base_fee_per_gas: None,
        }
    }
}

impl From<BlockV1> for Block {
    fn from(old: BlockV1) -> Self {
        Block::from(BlockV2::from(old))
    }
}

impl Record for Block {
    const KIND: RecordKind = RecordKind::Block;

    fn decode_one(version: FormatVersion, payload: &[u8]) -> Result<Self, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_one::<BlockV1, Self>(version, payload),
            FormatVersion::V2 => upgrade_one::<BlockV2, Self>(version, payload),
            FormatVersion::V3 => codec::deserialize(payload),
        }
    }

    fn decode_many(version: FormatVersion, payload: &[u8]) -> Result<Vec<Self>, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_many::<BlockV1, Self>(version, payload),
            FormatVersion::V2 => upgrade_many::<BlockV2, Self>(version, payload),
            FormatVersion::V3 => codec::deserialize(payload),
        }
    }
}
