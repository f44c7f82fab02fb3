//! Configuration service implementation.
//!
//! Loads [`ConsoleConfig`] from `config.toml`, creating the file with defaults
//! when it does not exist, then applies environment overrides.
//!
//! Priority: environment variables > config.toml > built-in defaults.

use crate::paths::ConsolePaths;
use console_core::config::ConsoleConfig;
use console_core::{ConsoleError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "SEQUENCE_CONSOLE_API_URL";
pub const ENV_API_TOKEN: &str = "SEQUENCE_CONSOLE_API_TOKEN";
pub const ENV_LOG_LEVEL: &str = "SEQUENCE_CONSOLE_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the platform configuration file.
    pub fn new_default() -> Result<Self> {
        let path = ConsolePaths::config_file().map_err(|e| ConsoleError::config(e.to_string()))?;
        Ok(Self { path })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file and applies overrides from the process environment.
    pub fn load(&self) -> Result<ConsoleConfig> {
        let config = self.load_file()?;
        Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
    }

    /// Loads the file only, creating it with defaults when missing.
    pub fn load_file(&self) -> Result<ConsoleConfig> {
        if !self.path.exists() {
            tracing::info!(
                target: "config",
                "No config at {}, writing defaults",
                self.path.display()
            );
            let config = ConsoleConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        let content = fs::read_to_string(&self.path)?;
        let mut config: ConsoleConfig = toml::from_str(&content)?;
        config.api_base_url = normalize_base_url(&config.api_base_url);
        tracing::debug!(target: "config", "Loaded config from {}", self.path.display());
        Ok(config)
    }

    pub fn save(&self, config: &ConsoleConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Applies environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    mut config: ConsoleConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConsoleConfig {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_empty(ENV_API_URL) {
        config.api_base_url = normalize_base_url(&url);
    }
    if let Some(token) = non_empty(ENV_API_TOKEN) {
        config.api_token = Some(token);
    }
    if let Some(level) = non_empty(ENV_LOG_LEVEL) {
        config.log_level = level;
    }
    config
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(dir.path().join("nested").join("config.toml"));

        let config = service.load_file().unwrap();

        assert_eq!(config, ConsoleConfig::default());
        assert!(service.path().exists());
    }

    #[test]
    fn test_file_values_are_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base_url = \"https://console.example.com/api/\"\nmin_loading_ms = 0\n",
        )
        .unwrap();

        let config = ConfigService::with_path(&path).load_file().unwrap();

        assert_eq!(config.api_base_url, "https://console.example.com/api");
        assert_eq!(config.min_loading_ms, 0);
        assert_eq!(config.notification_poll_interval_secs, 30);
    }

    #[test]
    fn test_malformed_file_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_base_url = [").unwrap();

        let err = ConfigService::with_path(&path).load_file().unwrap_err();
        assert!(matches!(err, ConsoleError::Serialization { .. }));
    }

    #[test]
    fn test_env_overrides_win() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_URL, "https://staging.example.com/api/"),
            (ENV_API_TOKEN, "secret-token"),
            (ENV_LOG_LEVEL, "  "),
        ]);

        let config = apply_env_overrides(ConsoleConfig::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });

        assert_eq!(config.api_base_url, "https://staging.example.com/api");
        assert_eq!(config.api_token.as_deref(), Some("secret-token"));
        assert_eq!(config.log_level, "info");
    }
}
