//! Cached record families and their historical payload layouts.
//!
//! Each record type knows how to decode every layout that was ever written
//! to disk (see [`FormatVersion`]) and converts it into the current layout.
//! Conversions either succeed without dropping information or fail with
//! [`ArchiveError::Conversion`].

mod abi;
mod account;
mod block;
mod reconciliation;
mod trace;
mod transaction;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::error::{ArchiveError, ConversionError};
use crate::header::{FormatVersion, RecordKind};

pub use abi::{Abi, AbiFunction, AbiV1, FunctionKind};
pub use account::{Appearance, CachedAccount, CachedAccountV1};
pub use block::{Block, BlockV1, BlockV2};
pub use reconciliation::{Reconciliation, ReconciliationV1};
pub use trace::{Trace, TraceV1};
pub use transaction::{Transaction, TransactionV1, TransactionV2};

pub type Address = [u8; 20];
pub type Hash = [u8; 32];

/// A record stored in an archive, in its current layout.
pub trait Record: Serialize + DeserializeOwned {
    const KIND: RecordKind;

    /// Decodes a single record written with `version`'s layout.
    fn decode_one(version: FormatVersion, payload: &[u8]) -> Result<Self, ArchiveError>;

    /// Decodes a record sequence written with `version`'s layout.
    fn decode_many(version: FormatVersion, payload: &[u8]) -> Result<Vec<Self>, ArchiveError>;
}

/// A historical payload layout that can still be written, for producing
/// fixtures of older caches.
pub trait LegacyLayout: Serialize {
    type Current: Record;
    const VERSION: FormatVersion;
}

pub(crate) fn upgrade_one<L, T>(version: FormatVersion, payload: &[u8]) -> Result<T, ArchiveError>
where
    L: DeserializeOwned,
    T: Record + TryFrom<L>,
    <T as TryFrom<L>>::Error: Into<ConversionError>,
{
    let legacy: L = codec::deserialize(payload)?;
    T::try_from(legacy).map_err(|err| conversion_error::<T>(version, err.into()))
}

pub(crate) fn upgrade_many<L, T>(
    version: FormatVersion,
    payload: &[u8],
) -> Result<Vec<T>, ArchiveError>
where
    L: DeserializeOwned,
    T: Record + TryFrom<L>,
    <T as TryFrom<L>>::Error: Into<ConversionError>,
{
    let legacy: Vec<L> = codec::deserialize(payload)?;
    legacy
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            T::try_from(item).map_err(|err| {
                let err: ConversionError = err.into();
                conversion_error::<T>(
                    version,
                    ConversionError::new(format!("element {idx}: {}", err.message)),
                )
            })
        })
        .collect()
}

fn conversion_error<T: Record>(version: FormatVersion, err: ConversionError) -> ArchiveError {
    ArchiveError::Conversion {
        kind: T::KIND,
        version,
        message: err.message,
    }
}

pub(crate) fn is_zero_address(address: &Address) -> bool {
    address.iter().all(|b| *b == 0)
}
