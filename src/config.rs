// src/config.rs

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Monitoring behavior settings
    pub monitor: MonitorConfig,

    /// HTTP client settings
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    ///
    /// A missing file is expected on first run and not logged.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            log::warn!("Config load failed from {path:?}: {e}. Using defaults.");
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.base_url.trim().is_empty() {
            return Err(AppError::config("monitor.base_url is empty"));
        }
        url::Url::parse(&self.monitor.base_url)
            .map_err(|e| AppError::config(format!("monitor.base_url is invalid: {e}")))?;
        if self.monitor.interval_minutes == 0 {
            return Err(AppError::config("monitor.interval_minutes must be > 0"));
        }
        if self.monitor.retention_hours == 0 {
            return Err(AppError::config("monitor.retention_hours must be > 0"));
        }
        if self.monitor.initial_batch_limit == 0 {
            return Err(AppError::config("monitor.initial_batch_limit must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.http.max_concurrent == 0 {
            return Err(AppError::config("http.max_concurrent must be > 0"));
        }
        Ok(())
    }

    /// Directory downloaded PDFs are written to.
    pub fn download_dir(&self) -> PathBuf {
        PathBuf::from(&self.monitor.download_dir)
    }

    /// Directory metadata records are written to.
    pub fn metadata_dir(&self) -> PathBuf {
        self.download_dir().join("metadata")
    }

    /// Retention window as a chrono duration.
    pub fn retention_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.monitor.retention_hours as i64)
    }
}

/// Monitoring behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// URL of the results listing page
    pub base_url: String,

    /// Minutes between checks in monitor mode
    pub interval_minutes: u64,

    /// Maximum downloads on a first run with no cursor
    pub initial_batch_limit: usize,

    /// Hours a downloaded file is kept before the sweeper deletes it
    pub retention_hours: u64,

    /// Directory downloaded PDFs are written to
    pub download_dir: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            interval_minutes: defaults::interval_minutes(),
            initial_batch_limit: defaults::initial_batch_limit(),
            retention_hours: defaults::retention_hours(),
            download_dir: defaults::download_dir(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,

    /// Maximum concurrent downloads within a pass
    pub max_concurrent: usize,

    /// Retry attempts per network operation
    pub retry_attempts: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            connect_timeout_secs: defaults::connect_timeout(),
            max_concurrent: defaults::max_concurrent(),
            retry_attempts: defaults::retry_attempts(),
        }
    }
}

mod defaults {
    // Monitor defaults
    pub fn base_url() -> String {
        "http://ggsipu.ac.in/ExamResults/ExamResultsmain.htm".into()
    }
    pub fn interval_minutes() -> u64 {
        5
    }
    pub fn initial_batch_limit() -> usize {
        20
    }
    pub fn retention_hours() -> u64 {
        24
    }
    pub fn download_dir() -> String {
        "results".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; ipu-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        120
    }
    pub fn connect_timeout() -> u64 {
        15
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn retry_attempts() -> u32 {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_base_url() {
        let mut config = Config::default();
        config.monitor.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_malformed_base_url() {
        let mut config = Config::default();
        config.monitor.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.http.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_retention() {
        let mut config = Config::default();
        config.monitor.retention_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [monitor]
            interval_minutes = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.monitor.interval_minutes, 10);
        assert_eq!(config.monitor.retention_hours, 24);
        assert_eq!(config.http.max_concurrent, 4);
    }

    #[test]
    fn metadata_dir_is_under_download_dir() {
        let config = Config::default();
        assert_eq!(config.metadata_dir(), config.download_dir().join("metadata"));
    }
}
