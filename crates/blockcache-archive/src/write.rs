use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::ArchiveError;
use crate::header::{content_hash, ArchiveHeader, FormatVersion, RecordKind, FLAG_ARRAY};
use crate::lock::{self, LockMode};
use crate::records::{LegacyLayout, Record};

/// Write handle on an archive file.
///
/// The file is locked before it is truncated, so a handle that fails with
/// [`ArchiveError::Locked`] never touches the other holder's content. An
/// archive holds exactly one payload; [`ArchiveWriter::finish`] refuses to
/// leave an empty file behind.
#[derive(Debug)]
pub struct ArchiveWriter {
    file: File,
    path: PathBuf,
    locked: bool,
    written: bool,
}

impl ArchiveWriter {
    pub fn create(path: &Path, mode: LockMode) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        let locked = lock::acquire(&file, path, mode)?;
        file.set_len(0)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            locked,
            written: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_record<T: Record>(&mut self, value: &T) -> Result<(), ArchiveError> {
        let payload = codec::serialize(value)?;
        self.write_payload(FormatVersion::CURRENT, T::KIND, 0, &payload)
    }

    pub fn write_array<T: Record>(&mut self, values: &[T]) -> Result<(), ArchiveError> {
        let payload = codec::serialize(values)?;
        self.write_payload(FormatVersion::CURRENT, T::KIND, FLAG_ARRAY, &payload)
    }

    pub(crate) fn write_legacy<L: LegacyLayout>(
        &mut self,
        value: &L,
    ) -> Result<(), ArchiveError> {
        let payload = codec::serialize(value)?;
        self.write_payload(L::VERSION, <L::Current as Record>::KIND, 0, &payload)
    }

    pub(crate) fn write_legacy_array<L: LegacyLayout>(
        &mut self,
        values: &[L],
    ) -> Result<(), ArchiveError> {
        let payload = codec::serialize(values)?;
        let flags = if L::VERSION == FormatVersion::V1 {
            0
        } else {
            FLAG_ARRAY
        };
        self.write_payload(L::VERSION, <L::Current as Record>::KIND, flags, &payload)
    }

    fn write_payload(
        &mut self,
        version: FormatVersion,
        kind: RecordKind,
        flags: u16,
        payload: &[u8],
    ) -> Result<(), ArchiveError> {
        if self.written {
            return Err(ArchiveError::AlreadyWritten);
        }

        let header = ArchiveHeader::new(
            version,
            kind,
            flags,
            payload.len() as u64,
            content_hash(payload),
        );
        self.file.write_all(&header.encode())?;
        self.file.write_all(payload)?;
        self.written = true;
        Ok(())
    }

    /// Flushes the archive to stable storage and closes the handle.
    pub fn finish(self) -> Result<(), ArchiveError> {
        if !self.written {
            return Err(ArchiveError::NothingWritten);
        }
        self.file.sync_all()?;
        Ok(())
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if self.locked {
            lock::release(&self.file, &self.path);
        }
    }
}
