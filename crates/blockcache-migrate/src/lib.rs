//! In-place upgrade of an on-disk block cache to the current archive format.
//!
//! ## Cache layout
//!
//! A cache root holds one subdirectory per [`CacheKind`] (`names/`, `recons/`,
//! `abis/`, `slurps/`, `txs/`, `blocks/`, `traces/`) plus a `tmp/` scratch
//! folder:
//! - `<kind>/**/*.bin`: archives (see `blockcache-archive`)
//! - `<kind>/**/ts.bin`: timestamp markers, never migrated
//! - `tmp/migrate.lock`: the section lock shared by cooperating migrators,
//!   created by the first applying run (dry runs never create it)
//! - `tmp/migrate.<pid>.<n>`: scratch files of in-flight rewrites
//!
//! ## Migration
//!
//! [`Migrator::run`] walks each configured directory in file-name order. Per
//! archive it either deletes it (empty files, derivable kinds), accepts it as
//! current, or rewrites it: the old archive is read under a non-blocking lock,
//! converted into a scratch file, and renamed over the original. A failure
//! stops the walk of that directory; the other directories still run.
//!
//! Rewrites happen inside a [`SectionLock`], so two migrators on the same
//! cache never interleave.

mod error;
mod kind;
mod layout;
mod lock;
mod migrate;
mod migrator;
mod replace;
mod stats;
mod visit;

pub use error::{MigrateError, Result};
pub use kind::{CacheKind, ParseCacheKindError};
pub use layout::{CacheConfig, CacheLayout, CacheTarget, CACHE_DIR_ENV_VAR, TMP_DIR_NAME};
pub use lock::{SectionGuard, SectionLock};
pub use migrate::{
    is_candidate_name, DirectoryReport, MigrationMode, MigrationOptions, MigrationReport,
    Migrator, ARCHIVE_SUFFIX, TIMESTAMP_MARKER,
};
pub use migrator::{disposal_for, Disposal, ReconciliationPolicy, RecordMigrator};
pub use stats::{FileOutcome, MigrationChecker, MigrationStats};
pub use visit::{visit_files, Halt};
