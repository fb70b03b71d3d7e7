use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::ConversationState;
use crate::services::scheduling::ReasonCode;

/// Failures inside a booking turn. None of these reach the caller as errors;
/// each is turned into a catalog message or logged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("slot extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("all model providers failed")]
    ProviderExhausted,

    #[error("proposed slot rejected: {0}")]
    ValidationRejection(ReasonCode),

    #[error("unknown service requested: {0}")]
    UnknownServiceRequested(String),

    #[error("invalid state transition {from} -> {to}")]
    InvalidStateTransition {
        from: ConversationState,
        to: ConversationState,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
