use std::fs::File;
use std::io;
use std::path::Path;

use fs2::FileExt as _;

use crate::error::ArchiveError;

/// How an archive handle coordinates with other holders of the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    /// Take an exclusive advisory lock, failing immediately on contention.
    #[default]
    NonBlocking,
    /// Do not lock. Only for files nobody else can see yet.
    Unlocked,
}

pub(crate) fn acquire(file: &File, path: &Path, mode: LockMode) -> Result<bool, ArchiveError> {
    match mode {
        LockMode::Unlocked => Ok(false),
        LockMode::NonBlocking => match file.try_lock_exclusive() {
            Ok(()) => Ok(true),
            Err(err) if is_contended(&err) => Err(ArchiveError::Locked {
                path: path.to_path_buf(),
            }),
            Err(err) => Err(err.into()),
        },
    }
}

pub(crate) fn release(file: &File, path: &Path) {
    if let Err(err) = file.unlock() {
        tracing::debug!(
            target: "blockcache.archive",
            path = %path.display(),
            error = %err,
            "failed to release archive lock"
        );
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
