//! Bootstrap configuration loading and resolution
//!
//! Settings sources priority:
//! 1. Command-line arguments
//! 2. Environment variables (`MCS_CONFIG`, `MCS_DATABASE_PATH`, `MCS_LOG_LEVEL`, `MCS_CACHE_URL`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing TOML file is not an error: the service logs a warning and
//! starts on defaults.

use crate::cache::{CacheType, CacheTypeConfig};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const ENV_CONFIG_PATH: &str = "MCS_CONFIG";
pub const ENV_DATABASE_PATH: &str = "MCS_DATABASE_PATH";
pub const ENV_LOG_LEVEL: &str = "MCS_LOG_LEVEL";
pub const ENV_CACHE_URL: &str = "MCS_CACHE_URL";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub integration: IntegrationConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub ai: AiConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Cache store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// External cache backend URL; in-process map when absent or unreachable
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Namespace prefix for every cache key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Per-type overrides keyed by cache type name (e.g. `strategy`)
    #[serde(default)]
    pub types: HashMap<String, CacheTypeConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            key_prefix: default_key_prefix(),
            types: HashMap::new(),
        }
    }
}

impl CacheConfig {
    /// Effective settings for a cache type (TOML override, else built-in default)
    pub fn type_config(&self, cache_type: CacheType) -> CacheTypeConfig {
        self.types
            .get(cache_type.as_str())
            .cloned()
            .unwrap_or_else(|| cache_type.default_config())
    }
}

/// Onboarding integration settings
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationConfig {
    /// A stored integration snapshot younger than this is reused as-is
    #[serde(default = "default_snapshot_fresh_hours")]
    pub snapshot_fresh_hours: i64,

    /// Max age for per-source `data_freshness` annotation decay
    #[serde(default = "default_source_max_age_days")]
    pub source_max_age_days: i64,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            snapshot_fresh_hours: default_snapshot_fresh_hours(),
            source_max_age_days: default_source_max_age_days(),
        }
    }
}

/// Data-quality scorer settings
#[derive(Debug, Clone, Deserialize)]
pub struct QualityConfig {
    /// Max age for freshness decay in quality assessment
    #[serde(default = "default_quality_max_age_days")]
    pub max_age_days: i64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_quality_max_age_days(),
        }
    }
}

/// AI collaborator settings
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Caller-side timeout for a single AI recommendation call
    #[serde(default = "default_ai_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_ai_timeout_seconds(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_key_prefix() -> String {
    "mcs_cache".to_string()
}

fn default_snapshot_fresh_hours() -> i64 {
    24
}

fn default_source_max_age_days() -> i64 {
    7
}

fn default_quality_max_age_days() -> i64 {
    30
}

fn default_ai_timeout_seconds() -> u64 {
    60
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load the TOML file if one resolves, else defaults
    ///
    /// Unreadable or malformed files are logged and ignored.
    pub fn load_or_default(cli_arg: Option<&str>) -> Self {
        let (config, source) = Self::load_with_source(cli_arg);
        source.log();
        config
    }

    /// [`load_or_default`](Self::load_or_default) without logging
    ///
    /// Returns where the settings came from so the caller can report it
    /// once a subscriber is installed.
    pub fn load_with_source(cli_arg: Option<&str>) -> (Self, ConfigSource) {
        let (mut config, source) = match resolve_config_path(cli_arg) {
            Some(path) => match Self::load(&path) {
                Ok(config) => (config, ConfigSource::File(path)),
                Err(e) => (
                    Self::default(),
                    ConfigSource::Ignored {
                        path,
                        error: e.to_string(),
                    },
                ),
            },
            None => (Self::default(), ConfigSource::Defaults),
        };
        config.apply_env_overrides();
        (config, source)
    }

    /// Environment variables override TOML values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(url) = std::env::var(ENV_CACHE_URL) {
            if !url.trim().is_empty() {
                self.cache.backend_url = Some(url);
            }
        }
    }
}

/// Where a loaded configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file resolved
    Defaults,
    /// A file resolved but could not be read or parsed
    Ignored { path: PathBuf, error: String },
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Defaults => warn!("No configuration file found, using built-in defaults"),
            ConfigSource::Ignored { path, error } => {
                warn!("Ignoring configuration file {}: {}", path.display(), error)
            }
        }
    }
}

/// Resolve the configuration file path
///
/// CLI argument -> `MCS_CONFIG` -> `~/.config/mcs/config.toml` (when present)
pub fn resolve_config_path(cli_arg: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(PathBuf::from(path));
    }
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|d| d.join("mcs").join("config.toml"))
        .filter(|p| p.exists())
}

/// Resolve the database path
///
/// CLI argument -> `MCS_DATABASE_PATH` -> TOML `database_path` -> OS default
pub fn resolve_database_path(cli_arg: Option<&str>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }
    if let Ok(path) = std::env::var(ENV_DATABASE_PATH) {
        return PathBuf::from(path);
    }
    if let Some(path) = &config.database_path {
        return path.clone();
    }
    default_database_path()
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mcs").join("mcs.db"))
        .unwrap_or_else(|| PathBuf::from("./mcs_data/mcs.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachePriority;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache.key_prefix, "mcs_cache");
        assert_eq!(config.integration.snapshot_fresh_hours, 24);
        assert_eq!(config.integration.source_max_age_days, 7);
        assert_eq!(config.quality.max_age_days, 30);
        assert_eq!(config.ai.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = TomlConfig::from_toml_str(
            r#"
            database_path = "/var/lib/mcs/mcs.db"

            [logging]
            level = "debug"

            [cache.types.strategy]
            ttl_seconds = 10
            max_size = 3
            priority = "low"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/var/lib/mcs/mcs.db")));
        assert_eq!(config.logging.level, "debug");

        let strategy = config.cache.type_config(CacheType::Strategy);
        assert_eq!(strategy.ttl_seconds, 10);
        assert_eq!(strategy.max_size, 3);
        assert_eq!(strategy.priority, CachePriority::Low);

        // Untouched types keep built-in defaults
        let onboarding = config.cache.type_config(CacheType::OnboardingIntegration);
        assert_eq!(onboarding, CacheType::OnboardingIntegration.default_config());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("database_path = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_database_path_cli_wins() {
        let config = TomlConfig {
            database_path: Some(PathBuf::from("/from/toml.db")),
            ..Default::default()
        };
        assert_eq!(
            resolve_database_path(Some("/from/cli.db"), &config),
            PathBuf::from("/from/cli.db")
        );
    }
}
