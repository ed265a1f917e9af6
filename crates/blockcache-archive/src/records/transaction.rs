use serde::{Deserialize, Serialize};

use super::{is_zero_address, upgrade_many, upgrade_one, Address, Hash, LegacyLayout, Record};
use crate::codec;
use crate::error::ArchiveError;
use crate::header::{FormatVersion, RecordKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: Hash,
    pub block_number: u64,
    pub transaction_index: u32,
    pub from: Address,
    /// `None` for contract creations.
    pub to: Option<Address>,
    pub value: u128,
    pub gas_used: u64,
    pub is_error: bool,
}

/// Version 1: 32-bit block numbers, 64-bit values, and the zero address in
/// `to` for contract creations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionV1 {
    pub hash: Hash,
    pub block_number: u32,
    pub transaction_index: u32,
    pub from: Address,
    pub to: Address,
    pub value: u64,
    pub gas_used: u64,
    pub is_error: bool,
}

/// Version 2 widened numbers but still encoded creations as the zero address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionV2 {
    pub hash: Hash,
    pub block_number: u64,
    pub transaction_index: u32,
    pub from: Address,
    pub to: Address,
    pub value: u128,
    pub gas_used: u64,
    pub is_error: bool,
}

impl LegacyLayout for TransactionV1 {
    type Current = Transaction;
    const VERSION: FormatVersion = FormatVersion::V1;
}

impl LegacyLayout for TransactionV2 {
    type Current = Transaction;
    const VERSION: FormatVersion = FormatVersion::V2;
}

impl From<TransactionV1> for TransactionV2 {
    fn from(old: TransactionV1) -> Self {
        TransactionV2 {
            hash: old.hash,
            block_number: u64::from(old.block_number),
            transaction_index: old.transaction_index,
            from: old.from,
            to: old.to,
            value: u128::from(old.value),
            gas_used: old.gas_used,
            is_error: old.is_error,
        }
    }
}

impl From<TransactionV2> for Transaction {
    fn from(old: TransactionV2) -> Self {
        Transaction {
            hash: old.hash,
            block_number: old.block_number,
            transaction_index: old.transaction_index,
            from: old.from,
            to: (!is_zero_address(&old.to)).then_some(old.to),
            value: old.value,
            gas_used: old.gas_used,
            is_error: old.is_error,
        }
    }
}

impl From<TransactionV1> for Transaction {
    fn from(old: TransactionV1) -> Self {
        Transaction::from(TransactionV2::from(old))
    }
}

impl Record for Transaction {
    const KIND: RecordKind = RecordKind::Transaction;

    fn decode_one(version: FormatVersion, payload: &[u8]) -> Result<Self, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_one::<TransactionV1, Self>(version, payload),
            FormatVersion::V2 => upgrade_one::<TransactionV2, Self>(version, payload),
            FormatVersion::V3 => codec::deserialize(payload),
        }
    }

    fn decode_many(version: FormatVersion, payload: &[u8]) -> Result<Vec<Self>, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_many::<TransactionV1, Self>(version, payload),
            FormatVersion::V2 => upgrade_many::<TransactionV2, Self>(version, payload),
            FormatVersion::V3 => codec::deserialize(payload),
        }
    }
}
