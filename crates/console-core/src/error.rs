//! Error types for the Sequence Console.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire console core.
///
/// The first four variants form the user-facing taxonomy: cancellation is
/// silent, transport failures are retry-capable, validation failures block a
/// network call, and precondition errors flag a caller bug.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConsoleError {
    /// The request was superseded or its session ended.
    #[error("Request cancelled")]
    Cancelled,

    /// Non-2xx response, connection failure or unreadable body.
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Local check that failed before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invariant violation that the UI affordances should never allow.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConsoleError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a cancellation (never shown to the user)
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is a transport failure
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this is a validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a precondition error
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether an explicit "try again" makes sense for this error.
    pub fn is_retryable(&self) -> bool {
        self.is_transport()
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ConsoleError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ConsoleError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ConsoleError>`.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_displays_bare_message() {
        let err = ConsoleError::transport(Some(502), "502 Bad Gateway");
        assert_eq!(err.to_string(), "502 Bad Gateway");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_cancelled_is_not_retryable() {
        assert!(ConsoleError::Cancelled.is_cancelled());
        assert!(!ConsoleError::Cancelled.is_retryable());
        assert!(!ConsoleError::validation("bad key").is_retryable());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: ConsoleError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConsoleError::Serialization { ref format, .. } if format == "JSON"));
    }
}
