use serde::de::DeserializeOwned;

use blockcache_migrate::CacheKind;

/// Non-fatal findings produced while loading and validating a config file.
///
/// Callers always get a `BlockcacheConfig` when deserialization succeeds;
/// diagnostics describe what was ignored or adjusted on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDiagnostics {
    /// Keys present in the input TOML that the schema does not know, as
    /// dotted paths (for example `cache.rooot`).
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<ConfigWarning>,
}

impl ConfigDiagnostics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unknown_keys.is_empty() && self.warnings.is_empty()
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// `logging.level` is neither a level nor a valid filter directive; the
    /// default level is used instead.
    LoggingLevelInvalid { value: String, normalized: String },
    /// `cache.kinds` names the same kind more than once.
    DuplicateKind { kind: CacheKind },
    /// `cache.kinds` is present but empty, which selects every kind.
    EmptyKinds,
}

pub(crate) fn deserialize_toml_with_unknown_keys<T: DeserializeOwned>(
    text: &str,
) -> Result<(T, Vec<String>), toml::de::Error> {
    let mut unknown = Vec::<String>::new();
    let deserializer = toml::de::Deserializer::new(text);
    let value = serde_ignored::deserialize(deserializer, |path| {
        unknown.push(dotted_key(&path));
    })?;
    unknown.sort();
    unknown.dedup();
    Ok((value, unknown))
}

/// Renders an ignored path as the dotted TOML key a user would write.
///
/// Every section of the schema is a plain table, so only map keys carry
/// information; wrapper segments are skipped.
fn dotted_key(path: &serde_ignored::Path<'_>) -> String {
    use serde_ignored::Path;

    let mut keys = Vec::new();
    let mut current = path;
    loop {
        current = match current {
            Path::Root => break,
            Path::Map { parent, key } => {
                keys.push(key.to_string());
                parent
            }
            Path::Seq { parent, .. }
            | Path::Some { parent }
            | Path::NewtypeStruct { parent }
            | Path::NewtypeVariant { parent } => parent,
        };
    }
    keys.reverse();
    keys.join(".")
}
