//! # Store Error Types
//!
//! Errors returned by store operations.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Store Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Remote      │  │     Local       │  │     Durability          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Network        │  │  Validation     │  │  Persistence            │ │
//! │  │  RemoteRejection│  │  StaleState     │  │  Serialization          │ │
//! │  │                 │  │  InvalidIndex   │  │                         │ │
//! │  │                 │  │  Cart           │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Configuration  │   Remote errors are also copied, as text, into    │
//! │  │                 │   the failing operation's error field so UIs can  │
//! │  │  InvalidConfig  │   subscribe instead of matching on results.       │
//! │  │  ConfigLoad/Save│                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use menu_core::{CoreError, ValidationError};
use thiserror::Error;

use crate::client::RemoteError;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The request never reached the server.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Rejected by server ({status}): {message}")]
    RemoteRejection { status: u16, message: String },

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Pre-flight check failed. No request was sent.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The target id is not in the local cache.
    #[error("{resource}/{id} is not in the local cache")]
    StaleState { resource: &'static str, id: String },

    /// A reorder index falls outside the scope.
    #[error("Index {index} is out of range for a scope of {len} items")]
    InvalidIndex { index: usize, len: usize },

    /// Cart rule violation.
    #[error("Cart error: {0}")]
    Cart(#[from] CoreError),

    // =========================================================================
    // Durability Errors
    // =========================================================================
    /// Persistence adapter failed to read or write.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Snapshot or response could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<RemoteError> for StoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(message) => StoreError::Network(message),
            RemoteError::Rejected { status, message } => {
                StoreError::RemoteRejection { status, message }
            }
            RemoteError::Decode(message) => StoreError::Serialization(message),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for StoreError {
    fn from(err: toml::ser::Error) -> Self {
        StoreError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl StoreError {
    /// Returns true if retrying the same call may succeed.
    ///
    /// Only network failures qualify. The store never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Network(_))
    }

    /// Returns true if the error was raised locally before any request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::InvalidIndex { .. }
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidConfig(_)
                | StoreError::ConfigLoadFailed(_)
                | StoreError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::Network("offline".into()).is_retryable());

        assert!(!StoreError::RemoteRejection {
            status: 422,
            message: "bad price".into()
        }
        .is_retryable());
        assert!(!StoreError::Persistence("disk full".into()).is_retryable());
    }

    #[test]
    fn test_remote_error_conversion() {
        let err: StoreError = RemoteError::Rejected {
            status: 404,
            message: "dish not found".into(),
        }
        .into();
        assert_eq!(
            err,
            StoreError::RemoteRejection {
                status: 404,
                message: "dish not found".into()
            }
        );

        let err: StoreError = RemoteError::Network("connection reset".into()).into();
        assert_eq!(err.to_string(), "Network error: connection reset");
    }

    #[test]
    fn test_validation_category() {
        let err: StoreError = ValidationError::Required {
            field: "name".into(),
        }
        .into();
        assert!(err.is_validation());
        assert!(StoreError::InvalidIndex { index: 9, len: 3 }.is_validation());
        assert!(!StoreError::Network("x".into()).is_validation());
    }

    #[test]
    fn test_stale_state_display() {
        let err = StoreError::StaleState {
            resource: "dishes",
            id: "d-42".into(),
        };
        assert_eq!(err.to_string(), "dishes/d-42 is not in the local cache");
    }
}
