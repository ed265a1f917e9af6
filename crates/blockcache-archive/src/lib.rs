//! Versioned binary archives for cached chain records.
//!
//! ## Format
//! Each archive is stored as:
//! - a fixed-size header (32 bytes, little-endian): magic, format version,
//!   record kind, flags, payload length, content hash
//! - a `bincode` payload holding one record or one homogeneous record array
//!
//! The payload layout of every record family changed over time; the header's
//! format version says which layout a file uses. Readers decode every
//! historical layout into the current one (see [`Record`]); writers only
//! produce [`FormatVersion::CURRENT`], except for the fixture writers in
//! [`legacy`].
//!
//! ## Locking
//! Handles opened with [`LockMode::NonBlocking`] take an exclusive `fs2`
//! advisory lock and fail with [`ArchiveError::Locked`] instead of waiting.

mod codec;
mod error;
mod header;
pub mod legacy;
mod lock;
mod read;
pub mod records;
mod write;

pub use codec::PAYLOAD_LIMIT_BYTES;
pub use error::{ArchiveError, ConversionError};
pub use header::{ArchiveHeader, FormatVersion, RecordKind, FLAG_ARRAY, HEADER_LEN, MAGIC};
pub use lock::LockMode;
pub use read::ArchiveReader;
pub use records::{LegacyLayout, Record};
pub use write::ArchiveWriter;
