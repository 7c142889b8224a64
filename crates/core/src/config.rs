use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::policy::offer::DEFAULT_MAX_DISCOUNT_PCT;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub policy: PolicyConfig,
    pub analytics: AnalyticsConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PolicyConfig {
    /// Maximum cash-offer discount, in percent.
    pub max_discount_pct: Decimal,
    /// Hours of inactivity before a hot lead stops being urgent.
    pub urgent_window_hours: i64,
}

#[derive(Clone, Debug, Default)]
pub struct AnalyticsConfig {
    /// When set, dual-written legacy events at or after this instant are
    /// excluded from analytics aggregation: their embedded mirror already
    /// counts them, so summing both sides would double count. Views and
    /// purchases have no embedded mirror and always count from the legacy
    /// side, whatever the cutover.
    pub legacy_cutover: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://garasi.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            policy: PolicyConfig {
                max_discount_pct: DEFAULT_MAX_DISCOUNT_PCT,
                urgent_window_hours: 24,
            },
            analytics: AnalyticsConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    policy: Option<PolicyPatch>,
    analytics: Option<AnalyticsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PolicyPatch {
    max_discount_pct: Option<Decimal>,
    urgent_window_hours: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyticsPatch {
    legacy_cutover: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<String>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("garasi.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }
        if let Some(policy) = patch.policy {
            if let Some(max_discount_pct) = policy.max_discount_pct {
                self.policy.max_discount_pct = max_discount_pct;
            }
            if let Some(urgent_window_hours) = policy.urgent_window_hours {
                self.policy.urgent_window_hours = urgent_window_hours;
            }
        }
        if let Some(analytics) = patch.analytics {
            if let Some(raw) = analytics.legacy_cutover {
                self.analytics.legacy_cutover = Some(parse_cutover("analytics.legacy_cutover", &raw)?);
            }
        }
        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format.parse()?;
            }
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("GARASI_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(value) = env::var("GARASI_MAX_DISCOUNT_PCT") {
            self.policy.max_discount_pct = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride { key: "GARASI_MAX_DISCOUNT_PCT".to_string(), value }
            })?;
        }
        if let Ok(value) = env::var("GARASI_LEGACY_CUTOVER") {
            self.analytics.legacy_cutover = Some(parse_cutover("GARASI_LEGACY_CUTOVER", &value)?);
        }
        if let Ok(level) = env::var("GARASI_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("GARASI_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.policy.max_discount_pct <= Decimal::ZERO
            || self.policy.max_discount_pct >= Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::Validation(
                "policy.max_discount_pct must be between 0 and 100 exclusive".to_string(),
            ));
        }
        if self.policy.urgent_window_hours <= 0 {
            return Err(ConfigError::Validation(
                "policy.urgent_window_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_cutover(key: &str, raw: &str) -> Result<DateTime<Utc>, ConfigError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

fn resolve_config_path(requested: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = requested {
        return path.exists().then(|| path.to_path_buf());
    }
    let default = PathBuf::from("garasi.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}
