//! Application configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (after reading a `.env` file, if present)
//! - A TOML file
//!
//! # Example
//!
//! ```rust,no_run
//! use notekeep_app::config::AppConfig;
//!
//! let config = AppConfig::from_env().expect("invalid configuration");
//! let config = AppConfig::from_file(std::path::Path::new("notekeep.toml")).expect("bad file");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use notekeep_core::defaults;
use notekeep_db::PoolConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue {
                name: "LOG_FORMAT",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Log file path; logs go to stdout when unset.
    pub file: Option<PathBuf>,
    /// Force ANSI colors on or off; auto-detected when unset.
    pub ansi: Option<bool>,
    /// Filter directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

/// Image storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for stored images; in-memory storage when unset.
    pub path: Option<PathBuf>,
    pub public_base_url: String,
    pub url_ttl_secs: u64,
    /// Secret for display URL signatures; random per process when unset.
    pub url_signing_key: Option<String>,
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            public_base_url: defaults::PUBLIC_BASE_URL.to_string(),
            url_ttl_secs: defaults::DISPLAY_URL_TTL_SECS,
            url_signing_key: None,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }
}

/// Data service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL URL; in-memory notes when unset.
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection.
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: defaults::DB_MAX_CONNECTIONS,
            min_connections: defaults::DB_MIN_CONNECTIONS,
            connect_timeout_secs: defaults::DB_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl DatabaseConfig {
    /// Pool settings for [`notekeep_db::Database::connect_with_config`].
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(std::time::Duration::from_secs(self.connect_timeout_secs))
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

fn parse_var<T: FromStr>(name: &'static str, value: String) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

fn parse_bool(name: &'static str, value: String) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source.
    ///
    /// Unset and empty variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.database.url = get("DATABASE_URL");
        if let Some(v) = get("DB_MAX_CONNECTIONS") {
            config.database.max_connections = parse_var("DB_MAX_CONNECTIONS", v)?;
        }
        if let Some(v) = get("DB_MIN_CONNECTIONS") {
            config.database.min_connections = parse_var("DB_MIN_CONNECTIONS", v)?;
        }
        if let Some(v) = get("DB_CONNECT_TIMEOUT_SECS") {
            config.database.connect_timeout_secs = parse_var("DB_CONNECT_TIMEOUT_SECS", v)?;
        }

        config.storage.path = get("FILE_STORAGE_PATH").map(PathBuf::from);
        if let Some(v) = get("PUBLIC_BASE_URL") {
            config.storage.public_base_url = v;
        }
        if let Some(v) = get("URL_TTL_SECS") {
            config.storage.url_ttl_secs = parse_var("URL_TTL_SECS", v)?;
        }
        config.storage.url_signing_key = get("URL_SIGNING_KEY");
        if let Some(v) = get("MAX_UPLOAD_BYTES") {
            config.storage.max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", v)?;
        }

        if let Some(v) = get("LOG_FORMAT") {
            config.log.format = v.parse()?;
        }
        config.log.file = get("LOG_FILE").map(PathBuf::from);
        if let Some(v) = get("LOG_ANSI") {
            config.log.ansi = Some(parse_bool("LOG_ANSI", v)?);
        }

        config.validate()?;
        debug!(
            database = if config.database.url.is_some() { "postgres" } else { "memory" },
            storage = if config.storage.path.is_some() { "filesystem" } else { "memory" },
            "Loaded configuration from environment"
        );
        Ok(config)
    }

    /// Load from a TOML file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database max_connections must be at least 1".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Validation(format!(
                "database min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.database.connect_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "database connect_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let base = &self.storage.public_base_url;
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "public_base_url must start with http:// or https://, got: {}",
                base
            )));
        }

        if self.storage.url_ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "url_ttl_secs must be greater than zero".to_string(),
            ));
        }

        if self.storage.url_ttl_secs > defaults::MAX_DISPLAY_URL_TTL_SECS {
            return Err(ConfigError::Validation(format!(
                "url_ttl_secs must be at most {} (7 days), got: {}",
                defaults::MAX_DISPLAY_URL_TTL_SECS,
                self.storage.url_ttl_secs
            )));
        }

        if self.storage.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        if matches!(&self.storage.url_signing_key, Some(key) if key.len() < 16) {
            return Err(ConfigError::Validation(
                "url_signing_key must be at least 16 characters".to_string(),
            ));
        }

        Ok(())
    }
}
