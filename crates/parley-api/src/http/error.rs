//! Application error type mapping to HTTP status codes and the envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use parley_types::error::ContextError;
use parley_types::llm::LlmError;

use crate::http::response::ApiResponse;

#[derive(Debug)]
pub enum AppError {
    Context(ContextError),
    /// The gateway call for the reply failed.
    Gateway(LlmError),
    NotFound(String),
    Validation(String),
}

impl From<ContextError> for AppError {
    fn from(e: ContextError) -> Self {
        AppError::Context(e)
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::Gateway(e)
    }
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Context(ContextError::Busy(_)) => (StatusCode::CONFLICT, "CONVERSATION_BUSY"),
            AppError::Context(ContextError::InvalidState(_)) => {
                (StatusCode::CONFLICT, "INVALID_CONVERSATION_STATE")
            }
            AppError::Context(ContextError::TransientGateway(_)) => {
                (StatusCode::BAD_GATEWAY, "SUMMARIZER_ERROR")
            }
            AppError::Context(ContextError::Persistence(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
            AppError::Gateway(LlmError::RateLimited { .. }) => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED")
            }
            AppError::Gateway(LlmError::Timeout(_)) => (StatusCode::GATEWAY_TIMEOUT, "GATEWAY_TIMEOUT"),
            AppError::Gateway(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Context(e) => e.to_string(),
            AppError::Gateway(e) => e.to_string(),
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::warn!(code, error = %self.message(), "Request failed");
        }
        (status, Json(ApiResponse::error(code, self.message()))).into_response()
    }
}
