//! Configuration resolution tests
//!
//! Tests that manipulate MCS_* environment variables are marked #[serial]
//! so they never race each other.

use mcs_common::cache::CacheType;
use mcs_common::config::{
    resolve_config_path, resolve_database_path, ConfigSource, TomlConfig, ENV_CACHE_URL, ENV_CONFIG_PATH,
    ENV_DATABASE_PATH, ENV_LOG_LEVEL,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    for var in [ENV_CONFIG_PATH, ENV_DATABASE_PATH, ENV_LOG_LEVEL, ENV_CACHE_URL] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    clear_env();
    let config = TomlConfig::load_or_default(Some("/definitely/not/here/mcs.toml"));

    assert_eq!(config.logging.level, "info");
    assert!(config.cache.backend_url.is_none());
    assert_eq!(
        config.cache.type_config(CacheType::Strategy),
        CacheType::Strategy.default_config()
    );
}

#[test]
#[serial]
fn test_load_from_file_then_env_overrides() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("mcs.toml");
    std::fs::write(
        &path,
        r#"
        database_path = "/srv/mcs/mcs.db"

        [logging]
        level = "warn"

        [integration]
        snapshot_fresh_hours = 12
        "#,
    )
    .unwrap();

    env::set_var(ENV_LOG_LEVEL, "trace");
    env::set_var(ENV_CACHE_URL, "sqlite:///tmp/mcs-cache.db");

    let config = TomlConfig::load_or_default(Some(path.to_str().unwrap()));

    assert_eq!(config.logging.level, "trace");
    assert_eq!(config.cache.backend_url.as_deref(), Some("sqlite:///tmp/mcs-cache.db"));
    assert_eq!(config.integration.snapshot_fresh_hours, 12);
    assert_eq!(config.integration.source_max_age_days, 7);

    clear_env();
}

#[test]
#[serial]
fn test_config_path_from_env() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/etc/mcs/custom.toml");

    assert_eq!(resolve_config_path(None), Some(PathBuf::from("/etc/mcs/custom.toml")));
    // CLI still wins
    assert_eq!(resolve_config_path(Some("/cli.toml")), Some(PathBuf::from("/cli.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_database_path_priority() {
    clear_env();
    let config = TomlConfig {
        database_path: Some(PathBuf::from("/toml/mcs.db")),
        ..Default::default()
    };

    assert_eq!(resolve_database_path(None, &config), PathBuf::from("/toml/mcs.db"));

    env::set_var(ENV_DATABASE_PATH, "/env/mcs.db");
    assert_eq!(resolve_database_path(None, &config), PathBuf::from("/env/mcs.db"));
    assert_eq!(resolve_database_path(Some("/cli/mcs.db"), &config), PathBuf::from("/cli/mcs.db"));

    env::remove_var(ENV_DATABASE_PATH);
    let defaults = resolve_database_path(None, &TomlConfig::default());
    assert!(defaults.ends_with("mcs.db"));
}

#[test]
#[serial]
fn test_load_reports_config_source() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let missing = temp_dir.path().join("missing.toml");
    let (config, source) = TomlConfig::load_with_source(Some(missing.to_str().unwrap()));
    assert_eq!(config.logging.level, "info");
    match source {
        ConfigSource::Ignored { path, error } => {
            assert_eq!(path, missing);
            assert!(error.contains("Read TOML failed"), "{}", error);
        }
        other => panic!("unexpected source {:?}", other),
    }

    let broken = temp_dir.path().join("broken.toml");
    std::fs::write(&broken, "[logging\nlevel = ").unwrap();
    let (_, source) = TomlConfig::load_with_source(Some(broken.to_str().unwrap()));
    assert!(matches!(source, ConfigSource::Ignored { ref path, .. } if *path == broken));

    let good = temp_dir.path().join("good.toml");
    std::fs::write(&good, "[logging]\nlevel = \"debug\"\n").unwrap();
    let (config, source) = TomlConfig::load_with_source(Some(good.to_str().unwrap()));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(source, ConfigSource::File(good));
}
