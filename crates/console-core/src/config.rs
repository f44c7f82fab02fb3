//! Console configuration model.
//!
//! Loading (file discovery, environment overrides) lives in
//! `console-infrastructure`; this is only the shape and its defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_MIN_LOADING_MS: u64 = 800;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the console backend, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Bearer token sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub notification_poll_interval_secs: u64,
    /// Minimum time a generation shows its loading state.
    #[serde(default = "default_min_loading_ms")]
    pub min_loading_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_min_loading_ms() -> u64 {
    DEFAULT_MIN_LOADING_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: None,
            notification_poll_interval_secs: default_poll_interval_secs(),
            min_loading_ms: default_min_loading_ms(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.notification_poll_interval_secs.max(1))
    }

    pub fn min_loading(&self) -> Duration {
        Duration::from_millis(self.min_loading_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ConsoleConfig = toml::from_str(
            r#"
            api_base_url = "https://console.example.com/api"
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://console.example.com/api");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.min_loading(), Duration::from_millis(800));
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = ConsoleConfig {
            notification_poll_interval_secs: 0,
            ..ConsoleConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}
