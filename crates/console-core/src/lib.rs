pub mod clock;
pub mod config;
pub mod error;
pub mod identity;
pub mod notification;
pub mod sequence;

// Re-export common error type
pub use error::{ConsoleError, Result};
