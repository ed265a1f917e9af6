use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use blockcache_archive::{ArchiveReader, ArchiveWriter, LockMode};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::MigrateError;
use crate::kind::CacheKind;
use crate::layout::{is_scratch_file_name, CacheLayout, CacheTarget};
use crate::lock::SectionLock;
use crate::migrator::{disposal_for, Disposal, ReconciliationPolicy, RecordMigrator};
use crate::replace::{remove_file, remove_file_best_effort, replace_file};
use crate::stats::{FileOutcome, MigrationChecker, MigrationStats};
use crate::visit::{visit_files, Halt};

/// Suffix of every archive file in the cache.
pub const ARCHIVE_SUFFIX: &str = ".bin";

/// Per-directory timestamp marker. Shares the archive suffix but is not an
/// archive.
pub const TIMESTAMP_MARKER: &str = "ts.bin";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationMode {
    /// Rewrite, delete, and replace files.
    #[default]
    Apply,
    /// Inspect every candidate and count what would change, touching nothing.
    DryRun,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    pub mode: MigrationMode,
    pub reconciliations: ReconciliationPolicy,
}

/// Outcome of migrating one cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryReport {
    pub kind: CacheKind,
    pub path: PathBuf,
    pub stats: MigrationStats,
    /// Set when the walk stopped before visiting every file.
    pub halt: Option<Halt>,
}

/// Outcome of a whole migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub mode: MigrationMode,
    pub directories: Vec<DirectoryReport>,
    pub totals: MigrationStats,
    /// Set when cancellation stopped the run before every directory was
    /// processed.
    pub cancelled: bool,
}

impl MigrationReport {
    pub fn has_failures(&self) -> bool {
        self.directories
            .iter()
            .any(|dir| dir.halt == Some(Halt::Failed))
    }
}

/// Drives migration of the cache directories under one cache root.
///
/// Owns the section lock shared by every file rewrite, so cooperating
/// migrators (in this or another process) never rewrite files concurrently.
/// A dry run only joins the section when the lockfile already exists.
#[derive(Debug)]
pub struct Migrator {
    layout: CacheLayout,
    section: Option<SectionLock>,
    options: MigrationOptions,
    cancel: CancellationToken,
    scratch_counter: AtomicU64,
}

impl Migrator {
    pub fn new(
        layout: CacheLayout,
        options: MigrationOptions,
        cancel: CancellationToken,
    ) -> Result<Self, MigrateError> {
        let lock_path = layout.section_lock_path();
        let section = match options.mode {
            MigrationMode::Apply => Some(SectionLock::open(&lock_path)?),
            MigrationMode::DryRun => SectionLock::open_existing(&lock_path)?,
        };
        Ok(Self {
            layout,
            section,
            options,
            cancel,
            scratch_counter: AtomicU64::new(0),
        })
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    /// Migrates every target in order and reports per-directory and total
    /// counters.
    ///
    /// A failure inside one directory stops that directory only. Cancellation
    /// stops the current directory and skips the remaining ones.
    pub fn run(&self, targets: &[CacheTarget]) -> MigrationReport {
        if self.options.mode == MigrationMode::Apply {
            self.sweep_stale_scratch();
        }

        let mut totals = MigrationStats::default();
        let mut directories = Vec::with_capacity(targets.len());
        let mut cancelled = false;

        for target in targets {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let report = self.migrate_directory(target);
            totals.merge(&report.stats);
            if report.halt == Some(Halt::Cancelled) {
                cancelled = true;
            }
            directories.push(report);
        }

        tracing::info!(
            target: "blockcache.migrate",
            seen = totals.seen,
            migrated = totals.migrated,
            skipped = totals.skipped,
            cancelled,
            "total: {}",
            totals
        );

        MigrationReport {
            mode: self.options.mode,
            directories,
            totals,
            cancelled,
        }
    }

    /// Walks one cache directory with a fresh checker.
    pub fn migrate_directory(&self, target: &CacheTarget) -> DirectoryReport {
        let mut checker = MigrationChecker::new(target.kind, &target.path);
        tracing::info!(
            target: "blockcache.migrate",
            kind = %target.kind,
            path = %target.path.display(),
            "checking cache directory"
        );

        let halt = if target.path.is_dir() {
            let flow = visit_files(&target.path, |path| {
                match self.migrate_file(target.kind, path) {
                    Ok(outcome) => checker.record(outcome),
                    Err(err) => {
                        checker.record_failure();
                        tracing::error!(
                            target: "blockcache.migrate",
                            kind = %target.kind,
                            path = %path.display(),
                            error = %err,
                            "migration failed; stopping this directory"
                        );
                        return ControlFlow::Break(Halt::Failed);
                    }
                }

                if self.cancel.is_cancelled() {
                    return ControlFlow::Break(Halt::Cancelled);
                }
                ControlFlow::Continue(())
            });
            match flow {
                ControlFlow::Continue(()) => None,
                ControlFlow::Break(halt) => Some(halt),
            }
        } else {
            tracing::debug!(
                target: "blockcache.migrate",
                path = %target.path.display(),
                "cache directory does not exist"
            );
            None
        };

        tracing::info!(
            target: "blockcache.migrate",
            kind = %target.kind,
            halt = ?halt,
            "{}",
            checker.report()
        );

        DirectoryReport {
            kind: checker.kind(),
            path: checker.path().to_path_buf(),
            halt,
            stats: checker.into_stats(),
        }
    }

    /// Runs one file through the migration state machine.
    pub fn migrate_file(&self, kind: CacheKind, path: &Path) -> Result<FileOutcome, MigrateError> {
        if !is_candidate_name(path) {
            tracing::debug!(
                target: "blockcache.migrate",
                path = %path.display(),
                "skipping non-candidate"
            );
            return Ok(FileOutcome::NotCandidate);
        }

        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                // Removed between listing and now.
                return Ok(FileOutcome::NotCandidate);
            }
            Err(err) => return Err(MigrateError::io(path, err)),
        };
        if !meta.is_file() {
            tracing::debug!(
                target: "blockcache.migrate",
                path = %path.display(),
                "skipping non-file entry"
            );
            return Ok(FileOutcome::NotCandidate);
        }

        let dry_run = self.options.mode == MigrationMode::DryRun;

        if meta.len() == 0 {
            if !dry_run {
                remove_file(path).map_err(|err| MigrateError::io(path, err))?;
            }
            tracing::info!(
                target: "blockcache.migrate",
                path = %path.display(),
                dry_run,
                "removed empty archive"
            );
            return Ok(FileOutcome::RemovedEmpty);
        }

        match disposal_for(kind, self.options.reconciliations) {
            Disposal::Remove => {
                if !dry_run {
                    remove_file(path).map_err(|err| MigrateError::io(path, err))?;
                }
                tracing::info!(
                    target: "blockcache.migrate",
                    path = %path.display(),
                    dry_run,
                    "removed derivable archive"
                );
                Ok(FileOutcome::RemovedDerivable)
            }
            Disposal::Accept => {
                tracing::debug!(
                    target: "blockcache.migrate",
                    path = %path.display(),
                    "accepted without rewrite"
                );
                Ok(FileOutcome::Accepted)
            }
            Disposal::Rewrite(migrator) => self.rewrite(kind, path, migrator, dry_run),
        }
    }

    fn rewrite(
        &self,
        kind: CacheKind,
        path: &Path,
        migrator: RecordMigrator,
        dry_run: bool,
    ) -> Result<FileOutcome, MigrateError> {
        let _section = self.section.as_ref().map(SectionLock::enter).transpose()?;

        let mut source = ArchiveReader::open(path, LockMode::NonBlocking)
            .map_err(|err| MigrateError::open(path, err))?;

        if !source.needs_upgrade(kind.is_array_style()) {
            tracing::debug!(
                target: "blockcache.migrate",
                path = %path.display(),
                "does not need an upgrade"
            );
            return Ok(FileOutcome::UpToDate);
        }

        if dry_run {
            tracing::info!(
                target: "blockcache.migrate",
                path = %path.display(),
                record = migrator.record(),
                from_version = source.header().format_version,
                "would migrate"
            );
            return Ok(FileOutcome::Rewritten);
        }

        let scratch = self.next_scratch_path();
        let mut dest = ArchiveWriter::create(&scratch, LockMode::NonBlocking)
            .map_err(|err| MigrateError::open(&scratch, err))?;

        let written = migrator
            .migrate(&mut source, &mut dest)
            .and_then(|()| dest.finish())
            .map_err(|err| MigrateError::migrate(path, err));
        if let Err(err) = written {
            remove_file_best_effort(&scratch, "migrate.failed");
            return Err(err);
        }

        let from_version = source.header().format_version;
        source.release();

        if let Err(err) = replace_file(&scratch, path) {
            remove_file_best_effort(&scratch, "migrate.replace_failed");
            return Err(MigrateError::io(path, err));
        }

        tracing::info!(
            target: "blockcache.migrate",
            path = %path.display(),
            record = migrator.record(),
            from_version,
            "migrated"
        );
        Ok(FileOutcome::Rewritten)
    }

    fn next_scratch_path(&self) -> PathBuf {
        let counter = self.scratch_counter.fetch_add(1, Ordering::Relaxed);
        self.layout.scratch_path(std::process::id(), counter)
    }

    /// Removes scratch files left behind by an interrupted run.
    ///
    /// Runs inside the section, so no cooperating migrator is mid-rewrite.
    fn sweep_stale_scratch(&self) {
        let Some(section) = &self.section else {
            return;
        };
        let _section = match section.enter() {
            Ok(guard) => guard,
            Err(err) => {
                tracing::warn!(
                    target: "blockcache.migrate",
                    error = %err,
                    "could not enter section to sweep scratch files"
                );
                return;
            }
        };

        let tmp_dir = self.layout.tmp_dir();
        let entries = match std::fs::read_dir(&tmp_dir) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::debug!(
                    target: "blockcache.migrate",
                    dir = %tmp_dir.display(),
                    error = %err,
                    "failed to read scratch directory"
                );
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_str().is_some_and(is_scratch_file_name) {
                tracing::info!(
                    target: "blockcache.migrate",
                    path = %entry.path().display(),
                    "removing stale scratch file"
                );
                remove_file_best_effort(&entry.path(), "sweep_stale_scratch");
            }
        }
    }
}

/// Whether `path` names a migration candidate: an archive suffix and not the
/// timestamp marker.
pub fn is_candidate_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.ends_with(ARCHIVE_SUFFIX) && name != TIMESTAMP_MARKER
}
