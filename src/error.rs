//! HTTP error envelope.
//!
//! Every failed request renders as
//!
//! ```json
//! { "error": { "code": "not_found", "message": "...", "details": { } } }
//! ```

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::errors::{CoreError, StoreError};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error description.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    Forbidden { message: String, details: Value },
    NotFound { message: String, details: Value },
    Conflict { message: String, details: Value },
    Gone { message: String, details: Value },
    RateLimited { message: String, details: Value },
    Unavailable { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn gone(message: impl Into<String>, details: Value) -> Self {
        Self::Gone {
            message: message.into(),
            details,
        }
    }
    pub fn rate_limited(message: impl Into<String>, details: Value) -> Self {
        Self::RateLimited {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Gone { .. } => StatusCode::GONE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Gone { .. } => "gone",
            Self::RateLimited { .. } => "rate_limited",
            Self::Unavailable { .. } => "unavailable",
            Self::Internal { .. } => "internal_error",
        }
    }

    fn parts(&self) -> (&String, &Value) {
        match self {
            Self::Validation { message, details }
            | Self::Unauthorized { message, details }
            | Self::Forbidden { message, details }
            | Self::NotFound { message, details }
            | Self::Conflict { message, details }
            | Self::Gone { message, details }
            | Self::RateLimited { message, details }
            | Self::Unavailable { message, details }
            | Self::Internal { message, details } => (message, details),
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let (message, details) = self.parts();
        ErrorInfo {
            code: self.code(),
            message: message.clone(),
            details: details.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.parts().0)
    }
}

impl std::error::Error for AppError {}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DuplicateCode(code) => {
                Self::conflict("Short code already exists", json!({ "code": code }))
            }
            CoreError::AllocationExhausted(attempts) => Self::unavailable(
                "Could not allocate a unique short code, try again",
                json!({ "attempts": attempts }),
            ),
            CoreError::RecordNotFound => Self::not_found("Short link not found", json!({})),
            CoreError::Expired => Self::gone("Short link has expired", json!({})),
            CoreError::RateLimited => Self::rate_limited("Too many requests", json!({})),
            CoreError::InvalidUrl(reason) => {
                Self::bad_request("Invalid URL format", json!({ "reason": reason }))
            }
            CoreError::InvalidCode(reason) => {
                Self::bad_request("Invalid short code", json!({ "reason": reason }))
            }
            CoreError::Forbidden(reason) => Self::forbidden("Forbidden", json!({ "reason": reason })),
            CoreError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Store error");
        Self::internal("Storage error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::bad_request(
            "Validation failed",
            serde_json::to_value(&errors).unwrap_or_default(),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_status_mapping() {
        let cases = [
            (CoreError::DuplicateCode("x".into()), StatusCode::CONFLICT),
            (
                CoreError::AllocationExhausted(5),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (CoreError::RecordNotFound, StatusCode::NOT_FOUND),
            (CoreError::Expired, StatusCode::GONE),
            (CoreError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (CoreError::InvalidUrl("bad".into()), StatusCode::BAD_REQUEST),
            (CoreError::InvalidCode("bad".into()), StatusCode::BAD_REQUEST),
            (CoreError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (
                CoreError::Store(StoreError::Backend("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_error_info_codes() {
        assert_eq!(
            AppError::from(CoreError::RateLimited).to_error_info().code,
            "rate_limited"
        );
        assert_eq!(
            AppError::from(CoreError::Expired).to_error_info().code,
            "gone"
        );
    }

    #[test]
    fn test_store_details_are_not_leaked() {
        let err = AppError::from(StoreError::Backend("password=hunter2".into()));
        let info = err.to_error_info();

        assert!(!info.message.contains("hunter2"));
        assert_eq!(info.details, json!({}));
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = AppError::unauthorized("Unauthorized", json!({})).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
