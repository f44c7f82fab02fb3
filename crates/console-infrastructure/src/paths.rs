//! Path management for console configuration files.
//!
//! ```text
//! ~/.config/sequence-console/   # Config directory (platform dependent)
//! └── config.toml               # Console configuration
//! ```

use std::path::PathBuf;

const APP_DIR_NAME: &str = "sequence-console";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find configuration directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct ConsolePaths;

impl ConsolePaths {
    /// Returns the console configuration directory (e.g. `~/.config/sequence-console/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
