use std::path::PathBuf;

use thiserror::Error;

use crate::header::{FormatVersion, RecordKind};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path} is locked by another holder")]
    Locked { path: PathBuf },
    #[error("not an archive: bad magic")]
    BadMagic,
    #[error("unknown record kind tag {0}")]
    UnknownRecordKind(u16),
    #[error("truncated archive: expected at least {expected} bytes, found {found}")]
    Truncated { expected: u64, found: u64 },
    #[error("payload size {payload_len} exceeds the archive payload limit")]
    OversizedPayload { payload_len: u64 },
    #[error("payload hash mismatch: expected {expected:#018x}, found {found:#018x}")]
    HashMismatch { expected: u64, found: u64 },
    #[error("unsupported {kind:?} archive version {version}")]
    UnsupportedVersion { kind: RecordKind, version: u32 },
    #[error("wrong record kind: expected {expected:?}, found {found:?}")]
    WrongKind {
        expected: RecordKind,
        found: RecordKind,
    },
    #[error("wrong payload shape: expected {}, found {}", shape(.expected_array), shape(.found_array))]
    WrongShape {
        expected_array: bool,
        found_array: bool,
    },
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("cannot convert {kind:?} {version} record: {message}")]
    Conversion {
        kind: RecordKind,
        version: FormatVersion,
        message: String,
    },
    #[error("archive writer finished without a payload")]
    NothingWritten,
    #[error("archive writer already holds a payload")]
    AlreadyWritten,
}

fn shape(array: &bool) -> &'static str {
    if *array {
        "array"
    } else {
        "single record"
    }
}

impl ArchiveError {
    /// Whether this error came from failing to take a non-blocking lock.
    pub fn is_lock_contention(&self) -> bool {
        matches!(self, ArchiveError::Locked { .. })
    }
}

/// Failure to represent a historical record in the current layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConversionError {
    pub message: String,
}

impl ConversionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::convert::Infallible> for ConversionError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
