use std::path::PathBuf;

use blockcache_archive::ArchiveError;

pub type Result<T> = std::result::Result<T, MigrateError>;

/// Errors produced while migrating cache archives.
///
/// Every per-file variant halts the walk of the directory it occurred in.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("failed to determine home directory for default cache path")]
    MissingHomeDir,

    #[error("{path} is locked by another process")]
    LockContention { path: PathBuf },

    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("could not convert {path}: {source}")]
    Conversion {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MigrateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps a failure to open an archive handle, separating lock contention
    /// from every other open failure.
    pub(crate) fn open(path: impl Into<PathBuf>, source: ArchiveError) -> Self {
        let path = path.into();
        if source.is_lock_contention() {
            Self::LockContention { path }
        } else {
            Self::Open { path, source }
        }
    }

    /// Maps a failure while moving records from the old handle to the new one.
    pub(crate) fn migrate(path: impl Into<PathBuf>, source: ArchiveError) -> Self {
        let path = path.into();
        match source {
            ArchiveError::Io(_) | ArchiveError::AlreadyWritten | ArchiveError::NothingWritten => {
                Self::Write { path, source }
            }
            source => Self::Conversion { path, source },
        }
    }
}
