//! Error types for Groups.io API operations.
//!
//! Errors are categorized so callers can tell a transport failure apart from
//! a call the service itself rejected, and give appropriate user feedback.

use std::fmt;

/// Result type alias for Groups.io operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network or HTTP transport errors.
    Network,
    /// The service answered with an `object: "error"` response.
    Api,
    /// Login failed or a mutating call was made without a session.
    Authentication,
    /// The response body could not be decoded.
    Format,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Api => "Groups.io rejected the request",
            Self::Authentication => "Authentication failed",
            Self::Format => "Unexpected response format",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::Api => "Check that the account has moderator permissions on the group",
            Self::Authentication => "Check GROUPSIO_USERNAME and GROUPSIO_PASSWORD",
            Self::Format => "The API may have changed, check the error details",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Groups.io.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed before a response body was read.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The service returned an error object.
    #[error("Groups.io API error: {kind}")]
    Api {
        /// The `type` field of the error object (e.g. `inadequate_permissions`).
        kind: String,
        /// HTTP status code of the response.
        status: Option<u16>,
    },

    /// Login did not yield a user session.
    #[error("login failed: {0}")]
    Authentication(String),

    /// A mutating call was attempted before logging in.
    #[error("not logged in: no CSRF token available")]
    NotAuthenticated,

    /// Invalid response from the API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Create an API error from the `type` field of an error object.
    pub fn api(kind: impl Into<String>, status: Option<u16>) -> Self {
        Self::Api {
            kind: kind.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpError { .. } => ErrorCategory::Network,
            Error::Api { .. } => ErrorCategory::Api,
            Error::Authentication(_) | Error::NotAuthenticated => ErrorCategory::Authentication,
            Error::InvalidResponse(_) => ErrorCategory::Format,
        }
    }

    /// The failure `type` reported by the service, or the error text otherwise.
    #[must_use]
    pub fn kind(&self) -> String {
        match self {
            Error::Api { kind, .. } => kind.clone(),
            other => other.to_string(),
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::HttpError {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
