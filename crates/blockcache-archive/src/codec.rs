use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ArchiveError;

/// Hard upper bound for any archive payload we will attempt to read.
///
/// A corrupted length prefix must fail the read, not request an enormous
/// allocation.
pub const PAYLOAD_LIMIT_BYTES: u64 = 64 * 1024 * 1024;

fn options() -> impl bincode::Options + Copy {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

fn options_limited() -> impl bincode::Options + Copy {
    options().with_limit(PAYLOAD_LIMIT_BYTES)
}

pub(crate) fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ArchiveError> {
    Ok(options().serialize(value)?)
}

pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ArchiveError> {
    Ok(options_limited().deserialize(bytes)?)
}
