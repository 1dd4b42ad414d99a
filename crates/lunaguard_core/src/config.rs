//! Session configuration loaded from TOML.
//!
//! # Responsibility
//! - Parse the `[remote]`, `[cache]` and `[logging]` sections.
//! - Reject values the rest of the core cannot work with before a session
//!   is opened.
//!
//! # Invariants
//! - A validated `RemoteConfig` always has an http(s) base URL, a non-empty
//!   api key and a timeout in 1..=9 seconds.

use crate::cache::DEFAULT_CACHE_QUOTA_BYTES;
use crate::logging::{default_log_level, LogLevel};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 5;
pub const REMOTE_TIMEOUT_RANGE: RangeInclusive<u64> = 1..=9;

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Public project key, sent as `apikey` on every request.
    pub api_key: String,
    /// Signed-in user token. Requests fall back to the api key without it.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub path: PathBuf,
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level_string")]
    pub level: String,
    pub dir: PathBuf,
}

impl AppConfig {
    /// Reads, parses and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.remote.validate()?;
        self.cache.validate()?;
        if let Some(logging) = &self.logging {
            logging.validate()?;
        }
        Ok(())
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "remote.base_url must start with http:// or https://, got `{base_url}`"
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "remote.api_key cannot be empty".to_string(),
            ));
        }
        if !REMOTE_TIMEOUT_RANGE.contains(&self.timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "remote.timeout_secs must be within {}..={}, got {}",
                REMOTE_TIMEOUT_RANGE.start(),
                REMOTE_TIMEOUT_RANGE.end(),
                self.timeout_secs
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("cache.path cannot be empty".to_string()));
        }
        if self.quota_bytes == Some(0) {
            return Err(ConfigError::Invalid(
                "cache.quota_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level()?;
        if !self.dir.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "logging.dir must be an absolute path, got `{}`",
                self.dir.display()
            )));
        }
        Ok(())
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        LogLevel::from_str(&self.level).map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}

fn default_quota_bytes() -> Option<usize> {
    Some(DEFAULT_CACHE_QUOTA_BYTES)
}

fn default_level_string() -> String {
    default_log_level().to_string()
}
