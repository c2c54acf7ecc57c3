//! Error handling module for projsetup
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Install failures never surface here: the install queue absorbs them and
//! reports them as events instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for projsetup
#[derive(Error, Debug)]
pub enum SetupError {
    /// An asset package or folder that should exist does not
    #[error("The asset package was not found at the path: {}", .0.display())]
    NotFound(PathBuf),

    /// A folder or asset could not be moved
    #[error("Failed to move {name}: {message}")]
    Move { name: String, message: String },

    /// A folder or asset could not be deleted
    #[error("Failed to delete {name}: {message}")]
    Delete { name: String, message: String },

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted preference store errors
    #[error("Preferences error: {0}")]
    Preferences(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for projsetup operations
pub type Result<T> = std::result::Result<T, SetupError>;

// Convenient error constructors
impl SetupError {
    /// Create a not-found error for a path
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a move error
    pub fn move_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Move {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a delete error
    pub fn delete_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delete {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a preferences error
    pub fn preferences(msg: impl Into<String>) -> Self {
        Self::Preferences(msg.into())
    }

    /// Returns true for the "source does not exist" class of errors
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SetupError::not_found("/cache/Bar/Foo.unitypackage");
        assert_eq!(
            err.to_string(),
            "The asset package was not found at the path: /cache/Bar/Foo.unitypackage"
        );

        let err = SetupError::move_failed("Scenes", "destination exists");
        assert_eq!(err.to_string(), "Failed to move Scenes: destination exists");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SetupError = io_err.into();
        assert!(matches!(err, SetupError::Io(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_constructors() {
        let err = SetupError::config("poll interval must be non-zero");
        assert!(matches!(err, SetupError::Config(_)));
        assert!(!err.is_not_found());

        let err = SetupError::delete_failed("TutorialInfo", "permission denied");
        assert!(matches!(err, SetupError::Delete { .. }));
    }
}
