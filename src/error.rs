//! Gateway error types with HTTP status code mapping.
//!
//! [`DispatchError`] is the central error type for the gateway. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response, and carries a stable numeric code so clients can branch
//! without parsing messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "offer no longer available: ...",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable numeric error code (see code ranges on [`DispatchError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status                |
/// |-----------|--------------------|----------------------------|
/// | 1000–1999 | Validation         | 400 Bad Request            |
/// | 2000–2099 | Not Found          | 404 Not Found              |
/// | 2100–2199 | State Conflict     | 409 Conflict               |
/// | 3000–3999 | Store / Internal   | 500 Internal Server Error  |
/// | 4000–4999 | Business Guard     | 422 Unprocessable Entity   |
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Request validation failed (malformed payload, missing field).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested action is not valid for the target resource.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Job with the given ID was not found.
    #[error("job not found: {0}")]
    JobNotFound(uuid::Uuid),

    /// Pro with the given ID was not found or is inactive.
    #[error("pro not found: {0}")]
    ProNotFound(uuid::Uuid),

    /// Assignment with the given ID was not found.
    #[error("assignment not found: {0}")]
    AssignmentNotFound(uuid::Uuid),

    /// The offer was already accepted, declined, or otherwise closed.
    #[error("offer no longer available: {0}")]
    OfferNoLongerAvailable(uuid::Uuid),

    /// The requested state transition is not legal from the current state.
    #[error("illegal transition: cannot {action} an assignment in state {from}")]
    IllegalTransition {
        /// Current assignment state.
        from: String,
        /// Attempted action.
        action: String,
    },

    /// A job-payout ledger entry already exists for this (job, pro) pair.
    #[error("ledger entry already exists for job {job_id} / pro {pro_id}")]
    LedgerEntryExists {
        /// Job the payout belongs to.
        job_id: uuid::Uuid,
        /// Pro the payout belongs to.
        pro_id: uuid::Uuid,
    },

    /// Completion prerequisites (proof-of-work artifacts) are not met.
    #[error("completion prerequisites not met for assignment {0}")]
    PrerequisitesNotMet(uuid::Uuid),

    /// Store round-trip failure. The only retryable category.
    #[error("store error: {0}")]
    StoreError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Returns the stable numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidAction(_) => 1002,
            Self::JobNotFound(_) => 2001,
            Self::ProNotFound(_) => 2002,
            Self::AssignmentNotFound(_) => 2003,
            Self::OfferNoLongerAvailable(_) => 2101,
            Self::IllegalTransition { .. } => 2102,
            Self::LedgerEntryExists { .. } => 2103,
            Self::PrerequisitesNotMet(_) => 4001,
            Self::StoreError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidAction(_) => StatusCode::BAD_REQUEST,
            Self::JobNotFound(_) | Self::ProNotFound(_) | Self::AssignmentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::OfferNoLongerAvailable(_)
            | Self::IllegalTransition { .. }
            | Self::LedgerEntryExists { .. } => StatusCode::CONFLICT,
            Self::PrerequisitesNotMet(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::StoreError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is a transient store failure worth retrying.
    ///
    /// Validation, not-found, and conflict errors are never retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::StoreError(_))
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
