use std::collections::BTreeSet;

use crate::diagnostics::ConfigWarning;
use crate::{BlockcacheConfig, LoggingConfig};

impl BlockcacheConfig {
    /// Checks semantic invariants the schema cannot express.
    ///
    /// Validation is best-effort: it reports as many problems as it finds in
    /// one pass.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut out = Vec::new();
        validate_kinds(self, &mut out);
        validate_logging(self, &mut out);
        out
    }
}

fn validate_kinds(config: &BlockcacheConfig, out: &mut Vec<ConfigWarning>) {
    let Some(kinds) = &config.cache.kinds else {
        return;
    };
    if kinds.is_empty() {
        out.push(ConfigWarning::EmptyKinds);
        return;
    }

    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for &kind in kinds {
        if !seen.insert(kind) && reported.insert(kind) {
            out.push(ConfigWarning::DuplicateKind { kind });
        }
    }
}

fn validate_logging(config: &BlockcacheConfig, out: &mut Vec<ConfigWarning>) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }
}
