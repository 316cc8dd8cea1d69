//! Configuration Module
//!
//! Runtime settings read from `STOREFRONT_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogSettings;
use crate::manager::SessionSettings;
use crate::storage::SecureStorage;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub cache_duration: Duration,
    pub refresh_threshold: Duration,
    pub check_interval: Duration,
    pub http_timeout: Duration,
    pub send_token_on_status_check: bool,
    pub log_filter: Option<String>,
    pub log_console: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            data_dir: SecureStorage::default_location(),
            cache_duration: Duration::from_secs(5 * 60),
            refresh_threshold: Duration::from_secs(10 * 60),
            check_interval: Duration::from_secs(60),
            http_timeout: Duration::from_secs(30),
            send_token_on_status_check: false,
            log_filter: None,
            log_console: cfg!(debug_assertions),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("STOREFRONT_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(dir) = lookup("STOREFRONT_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        let seconds = |key: &'static str, current: Duration| -> Result<Duration, ConfigError> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::Invalid { key, value: raw }),
                None => Ok(current),
            }
        };
        config.cache_duration = seconds("STOREFRONT_CACHE_SECS", config.cache_duration)?;
        config.refresh_threshold =
            seconds("STOREFRONT_REFRESH_THRESHOLD_SECS", config.refresh_threshold)?;
        config.check_interval = seconds("STOREFRONT_CHECK_INTERVAL_SECS", config.check_interval)?;
        config.http_timeout = seconds("STOREFRONT_HTTP_TIMEOUT_SECS", config.http_timeout)?;

        if config.check_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "STOREFRONT_CHECK_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        let flag = |key: &'static str, current: bool| -> Result<bool, ConfigError> {
            let Some(raw) = lookup(key) else {
                return Ok(current);
            };
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" | "" => Ok(false),
                _ => Err(ConfigError::Invalid { key, value: raw }),
            }
        };
        config.send_token_on_status_check = flag(
            "STOREFRONT_SEND_TOKEN_ON_STATUS_CHECK",
            config.send_token_on_status_check,
        )?;
        config.log_console = flag("STOREFRONT_LOG_CONSOLE", config.log_console)?;

        if let Some(directives) = lookup("STOREFRONT_LOG").filter(|v| !v.trim().is_empty()) {
            config.log_filter = Some(directives.trim().to_string());
        }

        Ok(config)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            cache_duration: to_chrono(self.cache_duration),
            refresh_threshold: to_chrono(self.refresh_threshold),
            send_token_on_status_check: self.send_token_on_status_check,
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings {
            dir: self.log_dir(),
            directives: self.log_filter.clone(),
            console: self.log_console,
        }
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
