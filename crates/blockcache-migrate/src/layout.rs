use std::path::{Path, PathBuf};

use crate::error::MigrateError;
use crate::kind::CacheKind;

/// Name of the scratch subfolder under the cache root.
pub const TMP_DIR_NAME: &str = "tmp";

/// Prefix of scratch files and of the section lock file inside the scratch
/// subfolder.
pub(crate) const SCRATCH_PREFIX: &str = "migrate.";

const SECTION_LOCK_FILE_NAME: &str = "migrate.lock";

/// Environment variable overriding the default cache root.
pub const CACHE_DIR_ENV_VAR: &str = "BLOCKCACHE_CACHE_DIR";

/// Configuration for selecting the cache root.
#[derive(Clone, Debug, Default)]
pub struct CacheConfig {
    /// Override the default cache root.
    pub cache_root_override: Option<PathBuf>,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            cache_root_override: std::env::var_os(CACHE_DIR_ENV_VAR).map(PathBuf::from),
        }
    }

    pub fn cache_root(&self) -> Result<PathBuf, MigrateError> {
        match &self.cache_root_override {
            Some(root) => Ok(root.clone()),
            None => default_cache_root(),
        }
    }
}

/// One configured cache directory and the kind it is classified as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheTarget {
    pub kind: CacheKind,
    pub path: PathBuf,
}

/// On-disk layout of a cache root: one subdirectory per [`CacheKind`] plus a
/// scratch folder used while rewriting archives.
#[derive(Clone, Debug)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: CacheKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join(TMP_DIR_NAME)
    }

    pub fn section_lock_path(&self) -> PathBuf {
        self.tmp_dir().join(SECTION_LOCK_FILE_NAME)
    }

    /// Scratch path for one in-flight migration.
    pub fn scratch_path(&self, pid: u32, counter: u64) -> PathBuf {
        self.tmp_dir().join(format!("{SCRATCH_PREFIX}{pid}.{counter}"))
    }

    pub fn targets(&self, kinds: &[CacheKind]) -> Vec<CacheTarget> {
        kinds
            .iter()
            .map(|&kind| CacheTarget {
                kind,
                path: self.dir(kind),
            })
            .collect()
    }
}

pub(crate) fn is_scratch_file_name(name: &str) -> bool {
    name.starts_with(SCRATCH_PREFIX) && name != SECTION_LOCK_FILE_NAME
}

pub(crate) fn default_cache_root() -> Result<PathBuf, MigrateError> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .ok_or(MigrateError::MissingHomeDir)?;

    Ok(home.join(".blockcache").join("cache"))
}
