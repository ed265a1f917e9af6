use serde::{Deserialize, Serialize};

use super::{upgrade_many, upgrade_one, Address, LegacyLayout, Record};
use crate::codec;
use crate::error::{ArchiveError, ConversionError};
use crate::header::{FormatVersion, RecordKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub block_number: u64,
    pub transaction_index: u32,
    /// Position in the call tree; empty for the top-level call.
    pub trace_address: Vec<u32>,
    pub from: Address,
    pub to: Address,
    pub value: u128,
}

/// Version 1 stored the trace address dash-joined, e.g. `"0-2-1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceV1 {
    pub block_number: u32,
    pub transaction_index: u32,
    pub trace_address: String,
    pub from: Address,
    pub to: Address,
    pub value: u64,
}

impl LegacyLayout for TraceV1 {
    type Current = Trace;
    const VERSION: FormatVersion = FormatVersion::V1;
}

impl TryFrom<TraceV1> for Trace {
    type Error = ConversionError;

    fn try_from(old: TraceV1) -> Result<Self, Self::Error> {
        Ok(Trace {
            block_number: u64::from(old.block_number),
            transaction_index: old.transaction_index,
            trace_address: parse_trace_address(&old.trace_address)?,
            from: old.from,
            to: old.to,
            value: u128::from(old.value),
        })
    }
}

fn parse_trace_address(text: &str) -> Result<Vec<u32>, ConversionError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split('-')
        .map(|part| {
            part.parse::<u32>().map_err(|err| {
                ConversionError::new(format!("invalid trace address `{text}`: {err}"))
            })
        })
        .collect()
}

impl Record for Trace {
    const KIND: RecordKind = RecordKind::Trace;

    fn decode_one(version: FormatVersion, payload: &[u8]) -> Result<Self, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_one::<TraceV1, Self>(version, payload),
            FormatVersion::V2 | FormatVersion::V3 => codec::deserialize(payload),
        }
    }

    fn decode_many(version: FormatVersion, payload: &[u8]) -> Result<Vec<Self>, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_many::<TraceV1, Self>(version, payload),
            FormatVersion::V2 | FormatVersion::V3 => codec::deserialize(payload),
        }
    }
}
