use blockcache_config::{BlockcacheConfig, ConfigWarning};
use blockcache_migrate::CacheKind;

#[test]
fn unknown_keys_are_reported_not_fatal() {
    let text = r#"
[cache]
rooot = "/typo"

[logging]
level = "info"
colour = true

[extra]
key = 1
"#;

    let (config, diagnostics) = BlockcacheConfig::load_from_str_with_diagnostics(text).unwrap();
    assert_eq!(config, BlockcacheConfig::default());
    assert_eq!(
        diagnostics.unknown_keys,
        vec!["cache.rooot", "extra", "logging.colour"]
    );
    assert!(diagnostics.warnings.is_empty());
}

#[test]
fn duplicate_and_empty_kinds_are_warnings() {
    let (_, diagnostics) = BlockcacheConfig::load_from_str_with_diagnostics(
        "[cache]\nkinds = [\"txs\", \"blocks\", \"transactions\", \"txs\"]\n",
    )
    .unwrap();
    assert_eq!(
        diagnostics.warnings,
        vec![ConfigWarning::DuplicateKind {
            kind: CacheKind::Transactions
        }]
    );

    let (config, diagnostics) =
        BlockcacheConfig::load_from_str_with_diagnostics("[cache]\nkinds = []\n").unwrap();
    assert_eq!(diagnostics.warnings, vec![ConfigWarning::EmptyKinds]);
    assert_eq!(config.kinds(), CacheKind::ALL.to_vec());
}

#[test]
fn invalid_logging_level_is_a_warning() {
    let (_, diagnostics) =
        BlockcacheConfig::load_from_str_with_diagnostics("[logging]\nlevel = \"loud=[\"\n")
            .unwrap();
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingLevelInvalid { value, .. }] if value == "loud=["
    ));

    let (_, diagnostics) = BlockcacheConfig::load_from_str_with_diagnostics(
        "[logging]\nlevel = \"blockcache.migrate=debug,warn\"\n",
    )
    .unwrap();
    assert!(diagnostics.is_empty());
}
