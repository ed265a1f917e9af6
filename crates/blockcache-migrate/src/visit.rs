use std::ops::ControlFlow;
use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

/// Why a directory walk stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Halt {
    /// The cancellation signal was observed.
    Cancelled,
    /// A file could not be migrated, or the tree could not be read.
    Failed,
}

/// Walks every non-directory entry under `root` in file-name order.
///
/// Returning [`ControlFlow::Break`] from `visit` abandons the rest of the
/// walk, including directories not yet entered. Symlinks are passed to
/// `visit` but never followed.
pub fn visit_files<F>(root: &Path, mut visit: F) -> ControlFlow<Halt>
where
    F: FnMut(&Path) -> ControlFlow<Halt>,
{
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::error!(
                    target: "blockcache.migrate",
                    root = %root.display(),
                    error = %err,
                    "failed to read cache directory"
                );
                return ControlFlow::Break(Halt::Failed);
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        if let ControlFlow::Break(halt) = visit(entry.path()) {
            return ControlFlow::Break(halt);
        }
    }

    ControlFlow::Continue(())
}
