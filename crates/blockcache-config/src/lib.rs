//! Configuration for the `blockcache` tool.
//!
//! The config file is TOML:
//!
//! ```toml
//! [cache]
//! root = "/path/to/cache"   # relative paths resolve against the config file
//! kinds = ["abis", "txs"]   # default: every kind
//! reconciliations = "skip"  # or "rewrite"
//!
//! [logging]
//! level = "info"            # a level or an `EnvFilter` directive string
//! json = false
//! ```
//!
//! Unknown keys are not fatal; they are reported through
//! [`ConfigDiagnostics`].

mod diagnostics;
mod validation;

use std::path::{Path, PathBuf};

use blockcache_migrate::{CacheConfig, CacheKind, ReconciliationPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use diagnostics::{ConfigDiagnostics, ConfigWarning};

/// Environment variable naming the config file when `--config` is not given.
pub const BLOCKCACHE_CONFIG_ENV_VAR: &str = "BLOCKCACHE_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockcacheConfig {
    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSection {
    /// Cache root. When unset, `$HOME/.blockcache/cache`.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Cache directories to migrate, in order. When unset, every kind.
    #[serde(default)]
    pub kinds: Option<Vec<CacheKind>>,

    #[serde(default)]
    pub reconciliations: ReconciliationPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            // Anything else is an `EnvFilter` directive string.
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// The effective `EnvFilter` for the tool's tracing output.
    ///
    /// `level` may be a simple level (`info`, `debug`, ...) or a full
    /// `EnvFilter` directive string. If `RUST_LOG` is set, it is merged in.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` embeds a source snippet; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl BlockcacheConfig {
    /// Loads a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_from_path_with_diagnostics(path).map(|(config, _)| config)
    }

    /// Loads a config file from TOML and reports unknown keys and semantic
    /// problems alongside it.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let (mut config, diagnostics) = Self::load_from_str_with_diagnostics(&text)?;
        if let (Some(root), Some(config_dir)) = (&config.cache.root, path.parent()) {
            if root.is_relative() {
                config.cache.root = Some(config_dir.join(root));
            }
        }
        Ok((config, diagnostics))
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<BlockcacheConfig>(text)?;
        let warnings = config.validate();
        Ok((
            config,
            ConfigDiagnostics {
                unknown_keys,
                warnings,
            },
        ))
    }

    /// Cache root selection: `flag`, then `BLOCKCACHE_CACHE_DIR`, then
    /// `cache.root`, then the default under the home directory.
    pub fn cache_config(&self, flag: Option<&Path>) -> CacheConfig {
        let cache_root_override = flag
            .map(Path::to_path_buf)
            .or_else(|| CacheConfig::from_env().cache_root_override)
            .or_else(|| self.cache.root.clone());
        CacheConfig {
            cache_root_override,
        }
    }

    /// Configured kinds in order with duplicates removed, or every kind.
    pub fn kinds(&self) -> Vec<CacheKind> {
        match &self.cache.kinds {
            Some(kinds) if !kinds.is_empty() => {
                let mut out = Vec::with_capacity(kinds.len());
                for &kind in kinds {
                    if !out.contains(&kind) {
                        out.push(kind);
                    }
                }
                out
            }
            _ => CacheKind::ALL.to_vec(),
        }
    }
}

/// Picks the config file: `flag`, else `BLOCKCACHE_CONFIG`, else none.
pub fn config_path(flag: Option<&Path>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| {
        std::env::var_os(BLOCKCACHE_CONFIG_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    })
}

/// Loads the config selected by [`config_path`].
///
/// With no config file, returns [`BlockcacheConfig::default`] and `None`.
pub fn load(
    flag: Option<&Path>,
) -> Result<(BlockcacheConfig, Option<PathBuf>, ConfigDiagnostics), ConfigError> {
    let Some(path) = config_path(flag) else {
        return Ok((
            BlockcacheConfig::default(),
            None,
            ConfigDiagnostics::default(),
        ));
    };

    let (config, diagnostics) = BlockcacheConfig::load_from_path_with_diagnostics(&path)?;
    Ok((config, Some(path), diagnostics))
}
