//! Writers for historical archive layouts.
//!
//! Nothing in the migration path writes old layouts; these exist to
//! reproduce caches left behind by older releases.

use std::path::Path;

use crate::error::ArchiveError;
use crate::lock::LockMode;
use crate::records::LegacyLayout;
use crate::write::ArchiveWriter;

pub fn write_legacy_archive<L: LegacyLayout>(path: &Path, value: &L) -> Result<(), ArchiveError> {
    let mut writer = ArchiveWriter::create(path, LockMode::NonBlocking)?;
    writer.write_legacy(value)?;
    writer.finish()
}

/// Writes a record sequence the way `L::VERSION` did, including the missing
/// array flag of version 1.
pub fn write_legacy_array_archive<L: LegacyLayout>(
    path: &Path,
    values: &[L],
) -> Result<(), ArchiveError> {
    let mut writer = ArchiveWriter::create(path, LockMode::NonBlocking)?;
    writer.write_legacy_array(values)?;
    writer.finish()
}
