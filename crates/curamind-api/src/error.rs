//! API error types and JSON error response formatting.
//!
//! Every failure is rendered as `{ "error": code, "message": text }` with a
//! stable code. Provider details are logged, never returned to the client.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use curamind_chat::error::GENERATION_FAILED_MESSAGE;
use curamind_chat::ChatError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 - malformed body or invalid message.
    #[error("{0}")]
    BadRequest(String),
    /// 413 - request body over the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),
    /// 429 - rate limit exceeded.
    #[error("rate limit exceeded")]
    TooManyRequests,
    /// 502 - no provider could produce a reply.
    #[error("{}", GENERATION_FAILED_MESSAGE)]
    GenerationFailed,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "too_many_requests"),
            ApiError::GenerationFailed => (StatusCode::BAD_GATEWAY, "generation_failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            error: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ChatError::Generation(_) => ApiError::GenerationFailed,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("request body too large".to_string())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curamind_chat::GenerationError;

    #[test]
    fn test_validation_errors_are_bad_request() {
        let err: ApiError = ChatError::EmptyMessage.into();
        assert_eq!(err.status_and_code(), (StatusCode::BAD_REQUEST, "bad_request"));

        let err: ApiError = ChatError::MessageTooLong(2000).into();
        assert_eq!(
            err.to_string(),
            "message exceeds maximum length of 2000 characters"
        );
    }

    #[test]
    fn test_generation_error_hides_detail() {
        let err: ApiError =
            ChatError::Generation(GenerationError::AuthFailure("HTTP 401 sk-secret".into())).into();
        assert_eq!(err.status_and_code(), (StatusCode::BAD_GATEWAY, "generation_failed"));
        assert_eq!(err.to_string(), GENERATION_FAILED_MESSAGE);
        assert!(!err.to_string().contains("sk-secret"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::TooManyRequests.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::PayloadTooLarge("big".into()).into_response().status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
