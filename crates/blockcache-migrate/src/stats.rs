use std::fmt;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::kind::CacheKind;

/// What happened to one file during a migration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Wrong suffix, the timestamp marker, or not a regular file.
    NotCandidate,
    /// Zero-byte archive removed.
    RemovedEmpty,
    /// Archive of a kind whose content is rebuilt on demand, removed.
    RemovedDerivable,
    /// Archive of a kind the policy declares current without rewriting it.
    Accepted,
    /// Rewritten in the current layout (or would be, in a dry run).
    Rewritten,
    /// Already in the current layout.
    UpToDate,
}

impl FileOutcome {
    pub fn is_candidate(self) -> bool {
        self != FileOutcome::NotCandidate
    }

    pub fn counts_as_migrated(self) -> bool {
        matches!(
            self,
            FileOutcome::RemovedEmpty
                | FileOutcome::RemovedDerivable
                | FileOutcome::Accepted
                | FileOutcome::Rewritten
        )
    }
}

/// Counters for one cache directory, or totals across several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStats {
    /// Candidate files inspected.
    pub seen: u64,
    /// Candidates rewritten, removed, or accepted by policy.
    pub migrated: u64,
    /// Files that are not migration candidates.
    pub skipped: u64,
}

impl MigrationStats {
    pub fn record(&mut self, outcome: FileOutcome) {
        if !outcome.is_candidate() {
            self.skipped += 1;
            return;
        }
        self.seen += 1;
        if outcome.counts_as_migrated() {
            self.migrated += 1;
        }
    }

    /// A candidate whose migration failed is still counted as seen.
    pub fn record_failure(&mut self) {
        self.seen += 1;
    }

    pub fn merge(&mut self, other: &MigrationStats) {
        self.seen += other.seen;
        self.migrated += other.migrated;
        self.skipped += other.skipped;
    }
}

impl AddAssign<&MigrationStats> for MigrationStats {
    fn add_assign(&mut self, rhs: &MigrationStats) {
        self.merge(rhs);
    }
}

impl fmt::Display for MigrationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seen: {} migrated: {} skipped: {}",
            self.seen, self.migrated, self.skipped
        )
    }
}

/// Per-directory counters tagged with the directory they describe.
#[derive(Debug, Clone)]
pub struct MigrationChecker {
    kind: CacheKind,
    path: PathBuf,
    stats: MigrationStats,
}

impl MigrationChecker {
    pub fn new(kind: CacheKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            stats: MigrationStats::default(),
        }
    }

    pub fn kind(&self) -> CacheKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stats(&self) -> &MigrationStats {
        &self.stats
    }

    pub fn record(&mut self, outcome: FileOutcome) {
        self.stats.record(outcome);
    }

    pub fn record_failure(&mut self) {
        self.stats.record_failure();
    }

    /// Human-readable summary, e.g. `txs: seen: 3 migrated: 2 skipped: 0`.
    pub fn report(&self) -> String {
        format!("{}: {}", self.kind, self.stats)
    }

    pub fn into_stats(self) -> MigrationStats {
        self.stats
    }
}
