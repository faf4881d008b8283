//! Unified API error handling
//!
//! This module provides a consistent error response format across all API endpoints.

use actix_web::http::header;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use uuid::Uuid;

use crate::service::account::AccountError;
use crate::service::ehr::EhrError;
use crate::service::notification::NotificationError;
use crate::service::prescription::PrescriptionError;
use crate::service::triage::TriageError;

/// Standard error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique request ID for tracing
    pub request_id: String,
}

/// Unified API error type
///
/// All API endpoints should return `Result<T, ApiError>` for consistent
/// error handling. Messages are returned to the client verbatim.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Missing or invalid credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the wrong kind of account (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Bad request / validation error (400)
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(String),

    /// A required component is not available (503)
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// The 401 used by the bearer-token extractors.
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid authentication credentials".to_string())
    }

    /// The 403 returned when a patient token hits a doctor endpoint.
    pub fn doctor_required() -> Self {
        ApiError::Forbidden("Access denied. Doctor credentials required.".to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Internal(_) => "internal_error",
            ApiError::Database(_) => "database_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        };

        tracing::error!(
            error_type = error_type,
            status = status.as_u16(),
            message = %self,
            "API error"
        );

        let mut builder = HttpResponse::build(status);
        if matches!(self, ApiError::Unauthorized(_)) {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }

        builder.json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            request_id: Uuid::new_v4().to_string(),
        })
    }
}

// ============================================================================
// From conversions for service errors
// ============================================================================

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::EmailTaken => ApiError::BadRequest(err.to_string()),
            AccountError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AccountError::InvalidToken => ApiError::invalid_credentials(),
            AccountError::Hash(msg) | AccountError::TokenSigning(msg) => ApiError::Internal(msg),
            AccountError::Db(e) => e.into(),
        }
    }
}

impl From<TriageError> for ApiError {
    fn from(err: TriageError) -> Self {
        match err {
            TriageError::EmptySymptoms | TriageError::TooShort => {
                ApiError::BadRequest(err.to_string())
            }
            TriageError::ClassifierUnavailable => ApiError::ServiceUnavailable(err.to_string()),
            TriageError::Notify(e) => e.into(),
            TriageError::Ehr(e) => e.into(),
            TriageError::Db(e) => e.into(),
        }
    }
}

impl From<EhrError> for ApiError {
    fn from(err: EhrError) -> Self {
        match err {
            EhrError::Invalid(msg) => ApiError::BadRequest(msg),
            EhrError::NoFileAttached => ApiError::BadRequest(err.to_string()),
            EhrError::FileMissing => ApiError::NotFound(err.to_string()),
            EhrError::Io(e) => ApiError::Internal(e.to_string()),
            EhrError::Notify(e) => e.into(),
            EhrError::Db(e) => e.into(),
        }
    }
}

impl From<PrescriptionError> for ApiError {
    fn from(err: PrescriptionError) -> Self {
        match err {
            PrescriptionError::NoActive | PrescriptionError::NotFound => {
                ApiError::NotFound(err.to_string())
            }
            PrescriptionError::Inactive => ApiError::BadRequest(err.to_string()),
            PrescriptionError::Notify(e) => e.into(),
            PrescriptionError::Db(e) => e.into(),
        }
    }
}

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<crate::db::DbError> for ApiError {
    fn from(err: crate::db::DbError) -> Self {
        match err {
            crate::db::DbError::NotFound(what) => {
                ApiError::NotFound(format!("Resource not found: {}", what))
            }
            _ => ApiError::Database(err.to_string()),
        }
    }
}
