use serde::{Deserialize, Serialize};

use super::{upgrade_many, upgrade_one, Address, LegacyLayout, Record};
use crate::codec;
use crate::error::ArchiveError;
use crate::header::{FormatVersion, RecordKind};

/// Balance change of one asset for one account at one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub block_number: u64,
    pub transaction_index: u32,
    pub asset_address: Address,
    pub begin_balance: i128,
    pub end_balance: i128,
    pub amount_net: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationV1 {
    pub block_number: u32,
    pub transaction_index: u32,
    pub asset_address: Address,
    pub begin_balance: i64,
    pub end_balance: i64,
}

impl LegacyLayout for ReconciliationV1 {
    type Current = Reconciliation;
    const VERSION: FormatVersion = FormatVersion::V1;
}

impl From<ReconciliationV1> for Reconciliation {
    fn from(old: ReconciliationV1) -> Self {
        let begin_balance = i128::from(old.begin_balance);
        let end_balance = i128::from(old.end_balance);
        Reconciliation {
            block_number: u64::from(old.block_number),
            transaction_index: old.transaction_index,
            asset_address: old.asset_address,
            begin_balance,
            end_balance,
            // Widened from i64, so this cannot overflow.
            amount_net: end_balance - begin_balance,
        }
    }
}

impl Record for Reconciliation {
    const KIND: RecordKind = RecordKind::Reconciliation;

    fn decode_one(version: FormatVersion, payload: &[u8]) -> Result<Self, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_one::<ReconciliationV1, Self>(version, payload),
            FormatVersion::V2 | FormatVersion::V3 => codec::deserialize(payload),
        }
    }

    fn decode_many(version: FormatVersion, payload: &[u8]) -> Result<Vec<Self>, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_many::<ReconciliationV1, Self>(version, payload),
            FormatVersion::V2 | FormatVersion::V3 => codec::deserialize(payload),
        }
    }
}
