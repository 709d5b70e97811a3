use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Unified error type that renders as a JSON `{"error": "..."}` response
/// with an appropriate HTTP status code.
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub retryable: bool,
}

impl AppError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            retryable: false,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self {
            retryable: true,
            ..Self::new(StatusCode::BAD_GATEWAY, msg)
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.message, "retryable": self.retryable })),
        )
            .into_response()
    }
}

impl From<weekpulse::WeekpulseError> for AppError {
    fn from(e: weekpulse::WeekpulseError) -> Self {
        use weekpulse::WeekpulseError;

        if e.is_retryable() {
            tracing::warn!(error = %e, "price feed unavailable");
            return AppError::bad_gateway(e.to_string());
        }
        match &e {
            WeekpulseError::RefreshInProgress => AppError::conflict(e.to_string()),
            WeekpulseError::NotFound(msg) => AppError::not_found(msg.clone()),
            WeekpulseError::InvalidArgument(msg) => AppError::bad_request(msg.clone()),
            WeekpulseError::InvalidResponse(msg) => AppError::bad_gateway(msg.clone()),
            _ => AppError::internal(e.to_string()),
        }
    }
}
