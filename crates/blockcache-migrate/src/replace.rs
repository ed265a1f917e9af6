use std::fs;
use std::io;
use std::path::Path;

/// Moves a fully written scratch file over `dest`.
///
/// A single `rename` that replaces the destination in place on every
/// platform, so readers see either the old or the new content and `dest` is
/// never absent. On failure the original is left untouched. The destination's
/// directory is synced afterwards so the rename survives a crash.
pub(crate) fn replace_file(scratch: &Path, dest: &Path) -> io::Result<()> {
    fs::rename(scratch, dest)?;

    if let Some(parent) = dest.parent() {
        sync_dir_best_effort(parent);
    }
    Ok(())
}

/// Removes a file, treating "already gone" as success.
pub(crate) fn remove_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

pub(crate) fn remove_file_best_effort(path: &Path, reason: &'static str) {
    if let Err(err) = remove_file(path) {
        tracing::debug!(
            target: "blockcache.migrate",
            path = %path.display(),
            reason,
            error = %err,
            "failed to remove file"
        );
    }
}

fn sync_dir_best_effort(dir: &Path) {
    #[cfg(unix)]
    {
        static SYNC_DIR_ERROR_LOGGED: std::sync::OnceLock<()> = std::sync::OnceLock::new();

        match fs::File::open(dir).and_then(|dir| dir.sync_all()) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                if SYNC_DIR_ERROR_LOGGED.set(()).is_ok() {
                    tracing::debug!(
                        target: "blockcache.migrate",
                        dir = %dir.display(),
                        error = %err,
                        "failed to sync directory (best effort)"
                    );
                }
            }
        }
    }

    #[cfg(not(unix))]
    let _ = dir;
}
