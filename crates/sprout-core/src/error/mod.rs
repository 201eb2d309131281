//! Error types and result aliases for sprout operations.
//!
//! Provides a unified error type covering catalog, resolution, conflict,
//! install and state failures with actionable error messages.

use thiserror::Error;

/// Unified error type for all sprout operations
#[derive(Error, Debug)]
pub enum SproutError {
    // Catalog errors
    #[error("Failed to fetch or parse catalog metadata: {message}")]
    Catalog { message: String },

    #[error("Invalid version string: {input}")]
    VersionParse { input: String },

    #[error("Package '{name}' not found in catalog")]
    PackageNotFound { name: String },

    // Resolution errors
    #[error("No version of '{package}' satisfies '{range}'")]
    NoMatchingVersion { package: String, range: String },

    #[error("Dependency conflicts detected:\n{report}")]
    Conflict { report: String },

    #[error("Operation aborted by caller")]
    OperationAborted,

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    // Install errors
    #[error("Failed to install '{package}': {message}")]
    Install { package: String, message: String },

    #[error("Invalid state: {message}")]
    State { message: String },

    // Transport errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    // Config errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },
}

/// Result type alias for sprout operations
pub type SproutResult<T> = Result<T, SproutError>;

impl SproutError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SproutError::Network { .. } | SproutError::Io { .. } | SproutError::Catalog { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            SproutError::PackageNotFound { .. } => {
                Some("Check the package name spelling or refresh the catalog")
            },
            SproutError::Network { .. } => Some("Check your internet connection and try again"),
            SproutError::Conflict { .. } => {
                Some("Pass --yes to proceed anyway, or update the conflicting packages first")
            },
            SproutError::CircularDependency { .. } => {
                Some("One of the packages declares a dependency cycle; report it upstream")
            },
            SproutError::NoMatchingVersion { .. } => {
                Some("Loosen the version range or pick an explicit available version")
            },
            _ => None,
        }
    }
}
