use std::fmt;
use std::io::{Cursor, Read};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;

pub const MAGIC: [u8; 8] = *b"BLKCACHE";
pub const HEADER_LEN: usize = 32;

/// Header flag set when the payload is a homogeneous sequence of records.
///
/// Version 1 writers never set this flag, even for array payloads.
pub const FLAG_ARRAY: u16 = 1 << 0;

/// On-disk layout generation of an archive payload.
///
/// The header layout itself is stable across versions; only the payload
/// encoding of each record changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    V1,
    V2,
    V3,
}

impl FormatVersion {
    pub const CURRENT: FormatVersion = FormatVersion::V3;

    pub const ALL: [FormatVersion; 3] = [FormatVersion::V1, FormatVersion::V2, FormatVersion::V3];

    pub fn as_u32(self) -> u32 {
        match self {
            FormatVersion::V1 => 1,
            FormatVersion::V2 => 2,
            FormatVersion::V3 => 3,
        }
    }

    pub fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(FormatVersion::V1),
            2 => Some(FormatVersion::V2),
            3 => Some(FormatVersion::V3),
            _ => None,
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u32())
    }
}

/// Record family stored in an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Abi,
    CachedAccount,
    Transaction,
    Block,
    Reconciliation,
    Trace,
}

impl RecordKind {
    pub fn tag(self) -> u16 {
        match self {
            RecordKind::Abi => 1,
            RecordKind::CachedAccount => 2,
            RecordKind::Transaction => 3,
            RecordKind::Block => 4,
            RecordKind::Reconciliation => 5,
            RecordKind::Trace => 6,
        }
    }

    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(RecordKind::Abi),
            2 => Some(RecordKind::CachedAccount),
            3 => Some(RecordKind::Transaction),
            4 => Some(RecordKind::Block),
            5 => Some(RecordKind::Reconciliation),
            6 => Some(RecordKind::Trace),
            _ => None,
        }
    }
}

/// Fixed-size little-endian header at the start of every archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    /// Raw version number as found on disk. May be newer than
    /// [`FormatVersion::CURRENT`] if another tool wrote the file.
    pub format_version: u32,
    pub kind: RecordKind,
    pub flags: u16,
    pub payload_len: u64,
    pub content_hash: u64,
}

impl ArchiveHeader {
    pub fn new(
        version: FormatVersion,
        kind: RecordKind,
        flags: u16,
        payload_len: u64,
        content_hash: u64,
    ) -> Self {
        Self {
            format_version: version.as_u32(),
            kind,
            flags,
            payload_len,
            content_hash,
        }
    }

    pub fn is_array(&self) -> bool {
        self.flags & FLAG_ARRAY != 0
    }

    /// Returns the decoded layout version, failing for versions this build
    /// does not know how to read.
    pub fn version(&self) -> Result<FormatVersion, ArchiveError> {
        FormatVersion::from_u32(self.format_version).ok_or(ArchiveError::UnsupportedVersion {
            kind: self.kind,
            version: self.format_version,
        })
    }

    /// Whether the archive was written with an older layout than
    /// [`FormatVersion::CURRENT`].
    ///
    /// Array-style archives additionally need an upgrade when the array flag is
    /// missing, which is how version 1 writers stored them.
    pub fn needs_upgrade(&self, is_array_style: bool) -> bool {
        let current = FormatVersion::CURRENT.as_u32();
        if self.format_version > current {
            return false;
        }
        if self.format_version < current {
            return true;
        }
        is_array_style && !self.is_array()
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..8].copy_from_slice(&MAGIC);
        LittleEndian::write_u32(&mut out[8..12], self.format_version);
        LittleEndian::write_u16(&mut out[12..14], self.kind.tag());
        LittleEndian::write_u16(&mut out[14..16], self.flags);
        LittleEndian::write_u64(&mut out[16..24], self.payload_len);
        LittleEndian::write_u64(&mut out[24..32], self.content_hash);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ArchiveError> {
        if bytes.len() < HEADER_LEN {
            return Err(ArchiveError::Truncated {
                expected: HEADER_LEN as u64,
                found: bytes.len() as u64,
            });
        }

        let mut cursor = Cursor::new(&bytes[..HEADER_LEN]);
        let mut magic = [0u8; 8];
        cursor.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(ArchiveError::BadMagic);
        }

        let format_version = cursor.read_u32::<LittleEndian>()?;
        let tag = cursor.read_u16::<LittleEndian>()?;
        let kind = RecordKind::from_tag(tag).ok_or(ArchiveError::UnknownRecordKind(tag))?;
        let flags = cursor.read_u16::<LittleEndian>()?;
        let payload_len = cursor.read_u64::<LittleEndian>()?;
        let content_hash = cursor.read_u64::<LittleEndian>()?;

        Ok(Self {
            format_version,
            kind,
            flags,
            payload_len,
            content_hash,
        })
    }
}

pub(crate) fn content_hash(payload: &[u8]) -> u64 {
    let hash = blake3::hash(payload);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}
