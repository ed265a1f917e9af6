use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use blockcache_config::{config_path, load, BlockcacheConfig, BLOCKCACHE_CONFIG_ENV_VAR};
use blockcache_migrate::CACHE_DIR_ENV_VAR;
use tempfile::tempdir;

static ENV_LOCK: Mutex<()> = Mutex::new(());

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn no_flag_and_no_env_means_no_config() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let _env = EnvVarGuard::unset(BLOCKCACHE_CONFIG_ENV_VAR);

    assert_eq!(config_path(None), None);
    let (config, path, diagnostics) = load(None).unwrap();
    assert_eq!(config, BlockcacheConfig::default());
    assert_eq!(path, None);
    assert!(diagnostics.is_empty());
}

#[test]
fn flag_wins_over_env() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let dir = tempdir().unwrap();
    let from_env = dir.path().join("env.toml");
    let from_flag = dir.path().join("flag.toml");
    std::fs::write(&from_env, "[logging]\nlevel = \"warn\"\n").unwrap();
    std::fs::write(&from_flag, "[logging]\nlevel = \"debug\"\n").unwrap();
    let _env = EnvVarGuard::set(BLOCKCACHE_CONFIG_ENV_VAR, &from_env);

    let (config, path, _) = load(Some(from_flag.as_path())).unwrap();
    assert_eq!(path, Some(from_flag));
    assert_eq!(config.logging.level, "debug");

    let (config, path, _) = load(None).unwrap();
    assert_eq!(path, Some(from_env));
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn cache_root_resolution_order() {
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK mutex poisoned");
    let mut config = BlockcacheConfig::default();
    config.cache.root = Some(PathBuf::from("/from/config"));

    {
        let _env = EnvVarGuard::set(CACHE_DIR_ENV_VAR, Path::new("/from/env"));
        let flag = config.cache_config(Some(Path::new("/from/flag")));
        assert_eq!(flag.cache_root().unwrap(), PathBuf::from("/from/flag"));
        let env = config.cache_config(None);
        assert_eq!(env.cache_root().unwrap(), PathBuf::from("/from/env"));
    }

    let _env = EnvVarGuard::unset(CACHE_DIR_ENV_VAR);
    assert_eq!(
        config.cache_config(None).cache_root().unwrap(),
        PathBuf::from("/from/config")
    );

    config.cache.root = None;
    let _home = EnvVarGuard::set("HOME", Path::new("/home/tester"));
    assert_eq!(
        config.cache_config(None).cache_root().unwrap(),
        PathBuf::from("/home/tester/.blockcache/cache")
    );
}
