use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use workout_state_core::{CoreError, StateValidationError};

/// Message prefix for storage failures while reading state.
pub const READ_FAILED: &str = "Error retrieving workout state";

/// Message prefix for storage failures while authorizing or writing state.
pub const WRITE_FAILED: &str = "Error updating workout state";

/// API error types with JSON responses.
///
/// The body is `{"Code": ..., "Message": ...}`; browser clients key off
/// `Code` to tell a missing state from a real failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Requested workout state does not exist.
    NotFound(String),
    /// Missing or invalid API key, or no key configured for the code.
    Unauthorized(String),
    /// Malformed input or a storage failure.
    BadRequest(String),
}

impl ApiError {
    /// Wrap a storage failure, keeping its message for diagnosis.
    pub fn storage(context: &str, err: CoreError) -> Self {
        tracing::error!(error = %err, "{context}");
        ApiError::BadRequest(format!("{context}: {err}"))
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NotFoundError",
            ApiError::Unauthorized(_) => "UnauthorizedError",
            ApiError::BadRequest(_) => "BadRequestError",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg) | ApiError::Unauthorized(msg) | ApiError::BadRequest(msg) => {
                msg.as_str()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "Code": self.code(),
            "Message": self.message(),
        });
        (self.status(), axum::Json(body)).into_response()
    }
}

impl From<StateValidationError> for ApiError {
    fn from(err: StateValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
