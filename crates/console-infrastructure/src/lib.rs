pub mod config_service;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::paths::{ConsolePaths, PathError};
