//! Error types for the Swarm application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionFailure;

/// A shared error type for the entire Swarm application.
///
/// Parser-level problems (incomplete payload JSON, unknown task targets) are
/// recovered where they occur and never show up here. What does show up is
/// either a caller mistake (unknown session id, retry of a running session),
/// an environment problem (config, IO), or a provider failure.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SwarmError {
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
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external provider failed while producing updates
    #[error("Provider error: {0}")]
    Provider(SessionFailure),

    /// The session is still consuming its stream
    #[error("Session '{id}' is still active")]
    SessionActive { id: String },

    /// The service was shut down and accepts no new sessions
    #[error("Service is shut down")]
    ShutDown,

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SwarmError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
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

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a config error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this error was raised for a session that has not finished yet
    pub fn is_session_active(&self) -> bool {
        matches!(self, Self::SessionActive { .. })
    }

    /// Check if this error was raised by a service that is shut down
    pub fn is_shut_down(&self) -> bool {
        matches!(self, Self::ShutDown)
    }

    /// Returns the provider failure carried by this error, if any.
    pub fn as_failure(&self) -> Option<&SessionFailure> {
        match self {
            Self::Provider(failure) => Some(failure),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SwarmError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SwarmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SwarmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<SessionFailure> for SwarmError {
    fn from(failure: SessionFailure) -> Self {
        Self::Provider(failure)
    }
}

/// A type alias for `Result<T, SwarmError>`.
pub type Result<T> = std::result::Result<T, SwarmError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FailureKind;

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let err: SwarmError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing file").into();
        match err {
            SwarmError::Io { message } => {
                assert!(message.contains("missing file"));
                assert!(message.contains("NotFound"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_provider_error_exposes_failure() {
        let err = SwarmError::from(SessionFailure::new(FailureKind::RateLimited, "slow down"));
        let failure = err.as_failure().expect("provider failure");
        assert_eq!(failure.kind, FailureKind::RateLimited);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_display() {
        let err = SwarmError::not_found("Session", "abc");
        assert_eq!(err.to_string(), "Entity not found: Session 'abc'");
        assert!(err.is_not_found());
    }
}
