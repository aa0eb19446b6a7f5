//! Error types for Stratum.
//!
//! This module provides the [`Error`] type shared by handlers, middleware and
//! the engine itself.
//!
//! # Taxonomy
//!
//! | Variant | Raised by | Recoverable via `on_error` |
//! |---|---|---|
//! | `Configuration` | middleware registration | no (setup time) |
//! | `Handler` | base handler, before/after hooks | yes |
//! | `Timeout` | deadline guard default response | yes |
//! | `Secondary` | a failing `on_error` hook | no |
//!
//! An error that no `on_error` hook recovers is returned to the caller as-is.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`Error`].
pub type StratumResult<T> = Result<T, Error>;

/// Categories of errors, used for log fields and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed middleware registration.
    Configuration,
    /// Failure raised by the handler or a before/after hook.
    Handler,
    /// The deadline guard fired before the handler settled.
    Timeout,
    /// An `on_error` hook failed while handling another error.
    Secondary,
}

impl ErrorCategory {
    /// Returns the snake_case name of this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Handler => "handler",
            Self::Timeout => "timeout",
            Self::Secondary => "secondary",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard error type for Stratum.
///
/// # Example
///
/// ```
/// use stratum_core::{Error, ErrorCategory};
///
/// fn parse_amount(raw: &str) -> Result<u64, Error> {
///     raw.parse()
///         .map_err(|_| Error::handler("amount must be a positive integer").with_status(422))
/// }
///
/// let err = parse_amount("abc").unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::Handler);
/// assert_eq!(err.status_code(), Some(422));
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Middleware registration was malformed.
    #[error("configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
    },

    /// The handler or a middleware hook failed.
    #[error("{message}")]
    Handler {
        /// Human-readable error message.
        message: String,
        /// Optional status code for HTTP-shaped responses.
        status_code: Option<u16>,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The invocation ran out of its soft time budget.
    #[error("{message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },

    /// An `on_error` hook failed; `original` is the error it was handling.
    #[error("{error}")]
    Secondary {
        /// The failure raised by the `on_error` hook.
        error: Box<Error>,
        /// The error that was being handled.
        #[source]
        original: Box<Error>,
    },
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a handler error.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            status_code: None,
            source: None,
        }
    }

    /// Creates a handler error wrapping a source error.
    pub fn handler_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            message: message.into(),
            status_code: None,
            source: Some(source.into()),
        }
    }

    /// Creates the default deadline error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout {
            message: "Timeout".to_string(),
        }
    }

    /// Attaches a status code. No-op for variants other than `Handler`.
    #[must_use]
    pub fn with_status(mut self, code: u16) -> Self {
        if let Self::Handler { status_code, .. } = &mut self {
            *status_code = Some(code);
        }
        self
    }

    /// Wraps `self` as the failure of an `on_error` hook that was handling
    /// `original`.
    #[must_use]
    pub fn caused_by(self, original: Error) -> Self {
        Self::Secondary {
            error: Box::new(self),
            original: Box::new(original),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Handler { .. } => ErrorCategory::Handler,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Secondary { .. } => ErrorCategory::Secondary,
        }
    }

    /// Returns the status code, looking through secondary errors.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Handler { status_code, .. } => *status_code,
            Self::Secondary { error, .. } => error.status_code(),
            _ => None,
        }
    }

    /// Returns `true` if this is a deadline error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns the error an `on_error` hook was handling when it failed.
    #[must_use]
    pub fn original_error(&self) -> Option<&Error> {
        match self {
            Self::Secondary { original, .. } => Some(original),
            _ => None,
        }
    }

    /// Converts this error to a serializable envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                message: self.to_string(),
                category: self.category(),
                status_code: self.status_code(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Self::Handler {
            message: error.to_string(),
            status_code: None,
            source: Some(error),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::handler_with_source("invalid JSON payload", error).with_status(422)
    }
}

/// Serializable error envelope, handy for `on_error` hooks building a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Status code, when one was attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}
