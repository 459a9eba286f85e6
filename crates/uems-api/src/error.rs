//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use uems_models::{RequestId, StudentId};
use uems_store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Student {0} is not registered")]
    InvalidStudent(StudentId),

    #[error("Student {0} already has a pending update request")]
    DuplicatePendingRequest(StudentId),

    #[error("Update request {0} not found")]
    RequestNotFound(RequestId),

    #[error("Update request {request_id} does not belong to student {student_id}")]
    StudentMismatch {
        request_id: RequestId,
        student_id: StudentId,
    },

    #[error("Update request {0} has already been reviewed")]
    NotPending(RequestId),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("A non-empty comment is required when rejecting a request")]
    MissingComment,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[source] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidStudent(_) => "invalid_student",
            ApiError::DuplicatePendingRequest(_) => "duplicate_pending_request",
            ApiError::RequestNotFound(_) => "request_not_found",
            ApiError::StudentMismatch { .. } => "student_mismatch",
            ApiError::NotPending(_) => "not_pending",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::MissingComment => "missing_comment",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Persistence(_) => "persistence_failure",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidStudent(_)
            | ApiError::RequestNotFound(_)
            | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicatePendingRequest(_)
            | ApiError::StudentMismatch { .. }
            | ApiError::NotPending(_)
            | ApiError::MissingComment
            | ApiError::Validation(_)
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Persistence(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// A lost compare-and-swap means a concurrent amend/review won the race and
/// the caller should re-read; every other store failure is a persistence
/// problem.
impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        if e.is_version_conflict() {
            ApiError::Conflict(e.to_string())
        } else {
            ApiError::Persistence(e)
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(code = self.code(), "{}", self);
        } else {
            debug!(code = self.code(), "{}", self);
        }

        // Don't expose internal error details in production
        let detail = if status.is_server_error()
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}
