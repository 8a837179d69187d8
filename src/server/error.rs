//! Mapping of [`ChatError`] onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{ChatError, ErrorCategory};

/// Error returned by API handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub ChatError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            err => match err.category() {
                ErrorCategory::Configuration => StatusCode::BAD_REQUEST,
                ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
                ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
                ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
