//! Store error types with HTTP status code mapping.
//!
//! [`StoreError`] is the single error type of the persistence core. Each
//! variant carries a stable [`kind`](StoreError::kind) string that clients
//! branch on, a numeric code, and an HTTP status used by the REST adapter.

use std::sync::atomic::{AtomicBool, Ordering};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::EventId;

/// Whether server-class error messages are rendered verbatim to clients.
///
/// Set once at startup from [`crate::config::GatewayConfig`]. Defaults to
/// `true` so tests and local runs see full messages.
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

/// Controls whether internal diagnostic detail reaches HTTP clients.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "kind": "validation_failed",
///     "message": "validation failed for field `venue`: must not be empty",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code, kind and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Stable machine-readable error kind.
    pub kind: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details (the offending field, when known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error enum for every store, normalization and connection failure.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                  |
/// |-----------|-----------------------|------------------------------|
/// | 1000–1999 | Validation            | 400 Bad Request              |
/// | 2000–2999 | Not Found / Conflict  | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / Connection   | 500 / 503                    |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Required configuration (the connection target) is absent.
    #[error("configuration missing: {0} is not set")]
    ConfigurationMissing(&'static str),

    /// Establishing the backing store connection failed. Retryable.
    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    /// A required field was empty after trimming.
    #[error("validation failed for field `{field}`: {reason}")]
    ValidationFailed {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The date could not be parsed into a real calendar date.
    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    /// The time could not be parsed as a 24-hour or 12-hour clock time.
    #[error("invalid time: {0:?}")]
    InvalidTime(String),

    /// The email does not have a `local@domain.tld` shape.
    #[error("invalid email: {0:?}")]
    InvalidEmail(String),

    /// A collection field had no items left after normalization.
    #[error("field `{0}` must contain at least one non-empty item")]
    EmptyCollection(&'static str),

    /// The title contains no characters a slug can be built from.
    #[error("cannot derive a slug from {0:?}")]
    EmptySlug(String),

    /// A slug supplied by a caller violates the route contract.
    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    /// Another event already holds this slug.
    #[error("slug already taken: {0}")]
    DuplicateSlug(String),

    /// The event changed between being read and being rewritten, on every
    /// attempt.
    #[error("event {0} was modified concurrently")]
    ConcurrentUpdate(EventId),

    /// The referenced event does not exist.
    #[error("event not found: {0}")]
    EventNotFound(EventId),

    /// A read found nothing under the given key.
    #[error("{resource} not found: {key}")]
    NotFound {
        /// Kind of record looked up.
        resource: &'static str,
        /// Lookup key.
        key: String,
    },

    /// Unexpected backing store failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Shorthand for [`StoreError::ValidationFailed`] with an empty-field reason.
    #[must_use]
    pub fn empty_field(field: &'static str) -> Self {
        Self::ValidationFailed {
            field,
            reason: "must not be empty".to_string(),
        }
    }

    /// Returns the stable, machine-readable kind of this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing(_) => "configuration_missing",
            Self::ConnectionFailure(_) => "connection_failure",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidTime(_) => "invalid_time",
            Self::InvalidEmail(_) => "invalid_email",
            Self::EmptyCollection(_) => "empty_collection",
            Self::EmptySlug(_) => "empty_slug",
            Self::InvalidSlug(_) => "invalid_slug",
            Self::DuplicateSlug(_) => "duplicate_slug",
            Self::ConcurrentUpdate(_) => "concurrent_update",
            Self::EventNotFound(_) => "event_not_found",
            Self::NotFound { .. } => "not_found",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::ValidationFailed { .. } => 1001,
            Self::InvalidDate(_) => 1002,
            Self::InvalidTime(_) => 1003,
            Self::InvalidEmail(_) => 1004,
            Self::EmptyCollection(_) => 1005,
            Self::EmptySlug(_) => 1006,
            Self::InvalidSlug(_) => 1007,
            Self::EventNotFound(_) => 2001,
            Self::NotFound { .. } => 2002,
            Self::DuplicateSlug(_) => 2003,
            Self::ConcurrentUpdate(_) => 2004,
            Self::Internal(_) => 3000,
            Self::ConfigurationMissing(_) => 3001,
            Self::ConnectionFailure(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationFailed { .. }
            | Self::InvalidDate(_)
            | Self::InvalidTime(_)
            | Self::InvalidEmail(_)
            | Self::EmptyCollection(_)
            | Self::EmptySlug(_)
            | Self::InvalidSlug(_) => StatusCode::BAD_REQUEST,
            Self::EventNotFound(_) | Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::DuplicateSlug(_) | Self::ConcurrentUpdate(_) => StatusCode::CONFLICT,
            Self::ConnectionFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::ConfigurationMissing(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` for errors caused by the server rather than the caller.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing(_) | Self::ConnectionFailure(_) | Self::Internal(_)
        )
    }

    /// Name of the offending field, for validation errors that have one.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::ValidationFailed { field, .. } | Self::EmptyCollection(field) => Some(field),
            Self::InvalidDate(_) => Some("date"),
            Self::InvalidTime(_) => Some("time"),
            Self::InvalidEmail(_) => Some("email"),
            Self::EmptySlug(_) => Some("title"),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::ConnectionFailure(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
            if EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed) {
                self.to_string()
            } else {
                "unexpected server error".to_string()
            }
        } else {
            self.to_string()
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                kind: self.kind(),
                message,
                details: self.field().map(str::to_string),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
