//! API error types with RFC 7807 Problem Details support.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use marquee_domain::DomainError;
use serde::{Deserialize, Serialize};

/// RFC 7807 Problem Details for HTTP APIs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub problem_type: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Application-specific error code
    pub code: String,

    /// Request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Whether the request can be retried
    pub retryable: bool,

    /// Field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// API error that converts to an RFC 7807 problem response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub problem: Box<ProblemDetails>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: impl Into<String>, title: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            status,
            problem: Box::new(ProblemDetails {
                problem_type: format!("https://marquee.events/problems/{code}"),
                title: title.into(),
                status: status.as_u16(),
                detail: None,
                instance: None,
                code,
                request_id: None,
                retryable: false,
                details: None,
            }),
        }
    }

    /// 400 Bad Request
    pub fn bad_request(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, title)
    }

    /// 401 Unauthorized
    pub fn unauthorized(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, title)
    }

    /// 403 Forbidden
    pub fn forbidden(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, title)
    }

    /// 404 Not Found
    pub fn not_found(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, title)
    }

    /// 409 Conflict
    pub fn conflict(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, title)
    }

    /// 422 Unprocessable Entity
    pub fn unprocessable(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, title)
    }

    /// 500 Internal Server Error
    pub fn internal(code: impl Into<String>, title: impl Into<String>) -> Self {
        let mut err = Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, title);
        err.problem.retryable = true;
        err
    }

    /// Add a detail message.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.problem.detail = Some(detail.into());
        self
    }

    /// Add a request ID for tracing.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.problem.request_id = Some(request_id.into());
        self
    }

    /// Add field-level validation errors.
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.problem.details = Some(details);
        self
    }

    /// Map a domain rule failure onto the wire representation.
    pub fn from_domain(err: DomainError, request_id: &str) -> Self {
        let mapped = match err {
            DomainError::NotFound { parameter, message } => {
                Self::not_found("not_found", message.clone()).with_details(vec![FieldError {
                    field: parameter.to_string(),
                    message,
                }])
            }
            DomainError::Forbidden(message) => Self::forbidden("forbidden", message),
            DomainError::Conflict { field, message } => {
                Self::conflict("conflict", message.clone()).with_details(vec![FieldError {
                    field: field.to_string(),
                    message,
                }])
            }
            DomainError::Unprocessable { field, message } => {
                Self::unprocessable("unprocessable", message.clone()).with_details(vec![
                    FieldError {
                        field: field.to_string(),
                        message,
                    },
                ])
            }
            DomainError::Store(e) => {
                tracing::error!(error = %e, request_id = %request_id, "Backing store operation failed");
                Self::internal("internal_error", "Internal server error")
            }
        };
        mapped.with_request_id(request_id.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.problem)).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.status, self.problem.code, self.problem.title)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// Tests
// ============================================================================
