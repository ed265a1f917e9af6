use serde::{Deserialize, Serialize};

use super::{upgrade_many, upgrade_one, Address, LegacyLayout, Record};
use crate::codec;
use crate::error::{ArchiveError, ConversionError};
use crate::header::{FormatVersion, RecordKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionKind {
    Function,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunction {
    pub name: String,
    /// Canonical text form, e.g. `transfer(address,uint256)`.
    pub signature: String,
    pub kind: FunctionKind,
}

/// Interface description of a single contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abi {
    pub address: Address,
    pub functions: Vec<AbiFunction>,
}

/// Version 1 stored bare signature strings; events carried an `event ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiV1 {
    pub address: Address,
    pub signatures: Vec<String>,
}

impl LegacyLayout for AbiV1 {
    type Current = Abi;
    const VERSION: FormatVersion = FormatVersion::V1;
}

impl TryFrom<AbiV1> for Abi {
    type Error = ConversionError;

    fn try_from(old: AbiV1) -> Result<Self, Self::Error> {
        let functions = old
            .signatures
            .iter()
            .map(|signature| parse_signature(signature))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Abi {
            address: old.address,
            functions,
        })
    }
}

fn parse_signature(text: &str) -> Result<AbiFunction, ConversionError> {
    let trimmed = text.trim();
    let (kind, rest) = match trimmed.strip_prefix("event ") {
        Some(rest) => (FunctionKind::Event, rest.trim_start()),
        None => (FunctionKind::Function, trimmed),
    };

    let open = rest
        .find('(')
        .ok_or_else(|| ConversionError::new(format!("signature `{text}` has no parameter list")))?;
    if !rest.ends_with(')') {
        return Err(ConversionError::new(format!(
            "signature `{text}` has an unterminated parameter list"
        )));
    }

    let name = rest[..open].trim();
    if name.is_empty() {
        return Err(ConversionError::new(format!("signature `{text}` has no name")));
    }

    Ok(AbiFunction {
        name: name.to_string(),
        signature: format!("{name}{}", &rest[open..]),
        kind,
    })
}

impl Record for Abi {
    const KIND: RecordKind = RecordKind::Abi;

    fn decode_one(version: FormatVersion, payload: &[u8]) -> Result<Self, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_one::<AbiV1, Self>(version, payload),
            FormatVersion::V2 | FormatVersion::V3 => codec::deserialize(payload),
        }
    }

    fn decode_many(version: FormatVersion, payload: &[u8]) -> Result<Vec<Self>, ArchiveError> {
        match version {
            FormatVersion::V1 => upgrade_many::<AbiV1, Self>(version, payload),
            FormatVersion::V2 | FormatVersion::V3 => codec::deserialize(payload),
        }
    }
}
