//! Error types for Portcullis.
//!
//! [`PortcullisError`] is the error type endpoints and middleware return when a
//! request cannot be completed. Every variant maps to exactly one HTTP status
//! through its [`ErrorCategory`]:
//!
//! | `ErrorCategory` | Status | Client sees |
//! |---|---|---|
//! | `BadRequest` | 400 | status text |
//! | `NotFound` | 404 | status text |
//! | `Internal` | 500 | status text only; details stay in the server log |
//!
//! Validation failures and domain conflicts are not errors at this level:
//! endpoints fold them into the form's error bag and re-render with 422.
//!
//! The capability errors ([`LookupError`], [`AuthenticateError`],
//! [`RegisterError`]) separate the expected domain outcomes from
//! infrastructure failures, which carry an opaque [`anyhow::Error`].

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed request or failed anti-forgery check.
    BadRequest,
    /// Resource not found.
    NotFound,
    /// Infrastructure failure or unexpected fault.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Portcullis.
///
/// # Example
///
/// ```
/// use portcullis_core::{ErrorCategory, PortcullisError};
///
/// let err = PortcullisError::bad_request("missing CSRF token");
/// assert_eq!(err.category(), ErrorCategory::BadRequest);
/// assert_eq!(err.status_code().as_u16(), 400);
/// ```
#[derive(Error, Debug)]
pub enum PortcullisError {
    /// The request was malformed or failed the anti-forgery check.
    #[error("Bad request: {message}")]
    BadRequest {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Infrastructure failure. Never exposed to clients.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl PortcullisError {
    /// Creates a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::BadRequest { .. } => ErrorCategory::BadRequest,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns `true` for errors that must be logged as infrastructure failures.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Failure to resolve a user or snippet by id.
#[derive(Error, Debug)]
pub enum LookupError {
    /// No live record with the given id exists.
    #[error("no matching record found")]
    NoRecord,

    /// The backing store could not answer.
    #[error("record lookup failed")]
    Infrastructure(#[source] anyhow::Error),
}

/// Failure to verify an email/password pair.
///
/// Unknown email, inactive account and wrong password are all reported as
/// [`AuthenticateError::InvalidCredentials`] so callers cannot tell which
/// half of the pair was wrong.
#[derive(Error, Debug)]
pub enum AuthenticateError {
    /// The credentials did not match an active account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The backing store could not answer.
    #[error("credential verification failed")]
    Infrastructure(#[source] anyhow::Error),
}

/// Failure to register a new user.
#[derive(Error, Debug)]
pub enum RegisterError {
    /// An account with this email already exists.
    #[error("duplicate email")]
    DuplicateEmail,

    /// The backing store could not answer.
    #[error("user registration failed")]
    Infrastructure(#[source] anyhow::Error),
}

impl From<LookupError> for PortcullisError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NoRecord => Self::not_found("no matching record found"),
            LookupError::Infrastructure(source) => {
                Self::internal_with_source("record lookup failed", source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_error() {
        let error = PortcullisError::bad_request("CSRF token mismatch");
        assert_eq!(error.category(), ErrorCategory::BadRequest);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("CSRF token mismatch"));
    }

    #[test]
    fn test_internal_error_hides_details() {
        let error = PortcullisError::internal_with_source(
            "database unreachable",
            anyhow::anyhow!("connection refused on 10.0.0.4:3306"),
        );
        assert!(error.is_internal());
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.to_string().contains("10.0.0.4"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_lookup_error_conversion() {
        let not_found: PortcullisError = LookupError::NoRecord.into();
        assert_eq!(not_found.category(), ErrorCategory::NotFound);

        let infra: PortcullisError =
            LookupError::Infrastructure(anyhow::anyhow!("timeout")).into();
        assert!(infra.is_internal());
        assert!(std::error::Error::source(&infra).is_some());
    }

    #[test]
    fn test_all_error_categories_have_status_codes() {
        let categories = [
            ErrorCategory::BadRequest,
            ErrorCategory::NotFound,
            ErrorCategory::Internal,
        ];

        for category in categories {
            let status = category.default_status_code();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "Category {:?} should map to error status code, got {}",
                category,
                status
            );
        }
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&ErrorCategory::BadRequest).unwrap();
        assert_eq!(json, "\"bad_request\"");
    }
}
