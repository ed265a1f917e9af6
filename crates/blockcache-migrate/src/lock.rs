use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fs2::FileExt as _;

use crate::error::MigrateError;

/// Critical section shared by every migration touching one cache root.
///
/// Owned by the orchestrator and passed to whoever rewrites files. Entering
/// takes an exclusive `fs2` lock on a lockfile, so cooperating processes
/// serialize on it too; the lock is released when the returned guard is
/// dropped.
#[derive(Debug)]
pub struct SectionLock {
    file: File,
    path: PathBuf,
    // `fs2` locks on one open file do not exclude threads sharing that file.
    threads: Mutex<()>,
}

impl SectionLock {
    /// Opens (creating if needed) the lockfile at `path`.
    pub fn open(path: &Path) -> Result<Self, MigrateError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| MigrateError::io(parent, err))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|err| MigrateError::io(path, err))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            threads: Mutex::new(()),
        })
    }

    /// Opens the lockfile at `path` only if it already exists, creating
    /// nothing. Used by read-only runs, which still wait for rewrites in
    /// progress but must not leave files behind.
    pub fn open_existing(path: &Path) -> Result<Option<Self>, MigrateError> {
        let file = match OpenOptions::new().read(true).open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(MigrateError::io(path, err)),
        };

        Ok(Some(Self {
            file,
            path: path.to_path_buf(),
            threads: Mutex::new(()),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enters the section. Blocks until other holders leave it.
    pub fn enter(&self) -> Result<SectionGuard<'_>, MigrateError> {
        let thread_guard = self
            .threads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.file
            .lock_exclusive()
            .map_err(|err| MigrateError::io(&self.path, err))?;

        Ok(SectionGuard {
            lock: self,
            _thread_guard: thread_guard,
        })
    }
}

/// Proof of being inside the section.
#[derive(Debug)]
pub struct SectionGuard<'a> {
    lock: &'a SectionLock,
    _thread_guard: MutexGuard<'a, ()>,
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.file.unlock() {
            tracing::debug!(
                target: "blockcache.migrate",
                path = %self.lock.path.display(),
                error = %err,
                "failed to release section lock"
            );
        }
    }
}
