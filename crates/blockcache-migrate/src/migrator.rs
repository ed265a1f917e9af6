use std::fmt;

use blockcache_archive::records::{Abi, Block, CachedAccount, Reconciliation, Trace, Transaction};
use blockcache_archive::{ArchiveError, ArchiveReader, ArchiveWriter, Record};
use serde::{Deserialize, Serialize};

use crate::kind::CacheKind;

/// How archives in the reconciliations directory are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationPolicy {
    /// Count every archive as migrated without touching it; reconciliations
    /// are recomputed on demand.
    #[default]
    Skip,
    /// Rewrite each archive's reconciliation array in the current layout.
    Rewrite,
}

/// Moves the content of an old-layout archive into a new handle.
#[derive(Clone, Copy)]
pub struct RecordMigrator {
    record: &'static str,
    run: fn(&mut ArchiveReader, &mut ArchiveWriter) -> Result<(), ArchiveError>,
}

impl RecordMigrator {
    pub fn single<T: Record>(record: &'static str) -> Self {
        Self {
            record,
            run: migrate_single::<T>,
        }
    }

    pub fn array<T: Record>(record: &'static str) -> Self {
        Self {
            record,
            run: migrate_array::<T>,
        }
    }

    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn migrate(
        &self,
        source: &mut ArchiveReader,
        dest: &mut ArchiveWriter,
    ) -> Result<(), ArchiveError> {
        (self.run)(source, dest)
    }
}

impl fmt::Debug for RecordMigrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordMigrator")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

fn migrate_single<T: Record>(
    source: &mut ArchiveReader,
    dest: &mut ArchiveWriter,
) -> Result<(), ArchiveError> {
    let item: T = source.read_record()?;
    dest.write_record(&item)
}

fn migrate_array<T: Record>(
    source: &mut ArchiveReader,
    dest: &mut ArchiveWriter,
) -> Result<(), ArchiveError> {
    let items: Vec<T> = source.read_array()?;
    dest.write_array(&items)
}

/// What a migration pass does with a candidate archive.
#[derive(Debug, Clone, Copy)]
pub enum Disposal {
    /// Delete it; the content is rebuilt on demand.
    Remove,
    /// Leave it untouched and count it as migrated.
    Accept,
    /// Upgrade it through the given migrator if it is outdated.
    Rewrite(RecordMigrator),
}

/// Selects the handling for every archive in a directory of `kind`.
pub fn disposal_for(kind: CacheKind, reconciliations: ReconciliationPolicy) -> Disposal {
    match kind {
        CacheKind::Names => Disposal::Remove,
        CacheKind::Reconciliations => match reconciliations {
            ReconciliationPolicy::Skip => Disposal::Accept,
            ReconciliationPolicy::Rewrite => {
                Disposal::Rewrite(RecordMigrator::array::<Reconciliation>("reconciliations"))
            }
        },
        CacheKind::Abis => Disposal::Rewrite(RecordMigrator::single::<Abi>("abi")),
        CacheKind::Slurps => {
            Disposal::Rewrite(RecordMigrator::single::<CachedAccount>("cached account"))
        }
        CacheKind::Transactions => {
            Disposal::Rewrite(RecordMigrator::single::<Transaction>("transaction"))
        }
        CacheKind::Blocks => Disposal::Rewrite(RecordMigrator::single::<Block>("block")),
        CacheKind::Traces => Disposal::Rewrite(RecordMigrator::array::<Trace>("traces")),
    }
}
