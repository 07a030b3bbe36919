//! Error types for impersonation, directory and file operations.
//!
//! The impersonation executor surfaces [`LogonError`] and passes work errors through unchanged,
//! while the directory engine converts every [`Error`] it meets into an empty or absent result.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Failure to acquire or switch to a security context for a principal.
///
/// Carries the native OS error code when one is available. Callers must not rely on specific
/// code values across platforms, only on the failure itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("logon failed for `{principal}`: {message}")]
pub struct LogonError {
    principal: String,
    code: Option<i32>,
    message: String,
}

impl LogonError {
    /// Creates a logon error reported by the native logon primitive.
    #[must_use]
    pub fn native(principal: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            code: Some(code),
            message: message.into(),
        }
    }

    /// Creates a logon error that has no native error code attached.
    #[must_use]
    pub fn other(principal: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            code: None,
            message: message.into(),
        }
    }

    /// Creates the error returned on platforms without native logon support.
    #[must_use]
    pub fn unsupported(principal: impl Into<String>) -> Self {
        Self::other(principal, "native logon is not supported on this platform")
    }

    /// Principal (`DOMAIN\user`) the logon was attempted for.
    #[must_use]
    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Native error code, if the OS reported one.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        self.code
    }

    /// Human-readable failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Main error type for impersonated file access and directory operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Identity acquisition failed
    #[error(transparent)]
    Logon(#[from] LogonError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// File system operation failed
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Path the operation was applied to
        path: String,
        /// Kind reported by the OS
        kind: io::ErrorKind,
        /// Error message
        message: String,
    },

    /// External service error
    #[error("External service error: {service}: {message}")]
    ExternalServiceError {
        /// Service name that failed
        service: String,
        /// Error message
        message: String,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Specialized result type for impersonation, directory and file operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an I/O error together with the path it occurred on.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, err: &io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Logon(_) => "LOGON_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Io { .. } => "IO_ERROR",
            Self::ExternalServiceError { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::InternalError(_)
                | Self::ConfigError(_)
                | Self::Logon(_)
                | Self::ExternalServiceError { .. }
        )
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}
