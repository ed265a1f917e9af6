use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::codec::PAYLOAD_LIMIT_BYTES;
use crate::error::ArchiveError;
use crate::header::{content_hash, ArchiveHeader, FormatVersion, HEADER_LEN};
use crate::lock::{self, LockMode};
use crate::records::Record;

/// Read-only handle on an archive file.
///
/// With [`LockMode::NonBlocking`] the handle holds an exclusive advisory lock
/// on the file until it is released or dropped.
#[derive(Debug)]
pub struct ArchiveReader {
    file: File,
    path: PathBuf,
    header: ArchiveHeader,
    locked: bool,
}

impl ArchiveReader {
    pub fn open(path: &Path, mode: LockMode) -> Result<Self, ArchiveError> {
        let mut file = File::open(path)?;
        let locked = lock::acquire(&file, path, mode)?;
        // Closing the file on error drops the lock with it.
        let header = read_header(&mut file)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            header,
            locked,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    pub fn needs_upgrade(&self, is_array_style: bool) -> bool {
        self.header.needs_upgrade(is_array_style)
    }

    /// Reads a single record, converting it from whatever layout it was
    /// written with.
    pub fn read_record<T: Record>(&mut self) -> Result<T, ArchiveError> {
        let version = self.expect_shape::<T>(false)?;
        let payload = self.read_payload()?;
        T::decode_one(version, &payload)
    }

    /// Reads a whole record sequence in one shot.
    pub fn read_array<T: Record>(&mut self) -> Result<Vec<T>, ArchiveError> {
        let version = self.expect_shape::<T>(true)?;
        let payload = self.read_payload()?;
        T::decode_many(version, &payload)
    }

    fn expect_shape<T: Record>(&self, array: bool) -> Result<FormatVersion, ArchiveError> {
        if self.header.kind != T::KIND {
            return Err(ArchiveError::WrongKind {
                expected: T::KIND,
                found: self.header.kind,
            });
        }

        let version = self.header.version()?;
        // Version 1 writers did not flag array payloads.
        let found_array = self.header.is_array() || (array && version == FormatVersion::V1);
        if found_array != array {
            return Err(ArchiveError::WrongShape {
                expected_array: array,
                found_array,
            });
        }
        Ok(version)
    }

    fn read_payload(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let payload_len = self.header.payload_len;
        if payload_len > PAYLOAD_LIMIT_BYTES {
            return Err(ArchiveError::OversizedPayload { payload_len });
        }

        let file_len = self.file.metadata()?.len();
        let expected = HEADER_LEN as u64 + payload_len;
        if file_len < expected {
            return Err(ArchiveError::Truncated {
                expected,
                found: file_len,
            });
        }

        let mut payload = vec![0u8; payload_len as usize];
        self.file.seek(SeekFrom::Start(HEADER_LEN as u64))?;
        self.file.read_exact(&mut payload)?;

        let found = content_hash(&payload);
        if found != self.header.content_hash {
            return Err(ArchiveError::HashMismatch {
                expected: self.header.content_hash,
                found,
            });
        }
        Ok(payload)
    }

    /// Unlocks and closes the handle.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ArchiveReader {
    fn drop(&mut self) {
        if self.locked {
            lock::release(&self.file, &self.path);
        }
    }
}

fn read_header(file: &mut File) -> Result<ArchiveHeader, ArchiveError> {
    let file_len = file.metadata()?.len();
    if file_len < HEADER_LEN as u64 {
        return Err(ArchiveError::Truncated {
            expected: HEADER_LEN as u64,
            found: file_len,
        });
    }

    let mut bytes = [0u8; HEADER_LEN];
    file.read_exact(&mut bytes)?;
    ArchiveHeader::decode(&bytes)
}
