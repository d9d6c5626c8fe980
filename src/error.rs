// src/error.rs

//! Unified error handling for the course watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The source could not produce a snapshot
    #[error("Source error for course {course}: {message}")]
    Source { course: u64, message: String },

    /// The sink rejected a notification
    #[error("Sink error for course {course}: {message}")]
    Sink { course: u64, message: String },

    /// A remote call did not finish in time
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// Snapshot store error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a source error for a course.
    pub fn source(course: u64, message: impl fmt::Display) -> Self {
        Self::Source {
            course,
            message: message.to_string(),
        }
    }

    /// Create a sink error for a course.
    pub fn sink(course: u64, message: impl fmt::Display) -> Self {
        Self::Sink {
            course,
            message: message.to_string(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            secs,
        }
    }

    /// Create a storage error.
    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    /// Whether the error describes a remote side that may recover by the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Timeout { .. } | Self::Source { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AppError::timeout("fetch", 30).is_transient());
        assert!(AppError::source(7, "maintenance").is_transient());
        assert!(!AppError::config("no courses").is_transient());
        assert!(!AppError::storage("disk full").is_transient());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::sink(42, "status 500");
        assert_eq!(err.to_string(), "Sink error for course 42: status 500");

        let err = AppError::timeout("fetch", 5);
        assert_eq!(err.to_string(), "fetch timed out after 5s");
    }
}
