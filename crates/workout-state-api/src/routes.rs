use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use workout_state_core::{WorkoutCode, WorkoutState, WorkoutStateRecord, parse_workout_state};

use crate::auth::AuthorizedCode;
use crate::errors::{ApiError, READ_FAILED, WRITE_FAILED};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SetStateResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "startDateTime", skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<String>,
}

/// GET /
pub async fn index_handler() -> Json<Value> {
    Json(serde_json::json!({ "hello": "world" }))
}

/// GET /workout-state/{workout_code}
///
/// Public read. Returns the stored state object unchanged, or 404 when the
/// code was never written or its state has expired.
pub async fn get_state_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<WorkoutState>, ApiError> {
    let code = WorkoutCode::from(code);
    let now = Utc::now().timestamp();

    let record = state
        .store
        .get_state(&code, now)
        .await
        .map_err(|e| ApiError::storage(READ_FAILED, e))?
        .ok_or_else(|| ApiError::NotFound(format!("Workout state not found for code: {code}")))?;

    Ok(Json(record.state))
}

/// POST /workout-state/{workout_code}/{api_key}
///
/// An empty (or `null`) body clears the state; otherwise the body must be
/// exactly `{"startDateTime": <timezone-aware ISO 8601>}` and replaces it,
/// resetting the 14 day expiry.
///
/// The API key is checked before the body is read, so a request with a bad
/// key gets 401 even when its body is malformed JSON.
pub async fn set_state_handler(
    State(state): State<AppState>,
    AuthorizedCode(code): AuthorizedCode,
    body: Bytes,
) -> Result<Json<SetStateResponse>, ApiError> {
    let Some(body) = parse_body(&body)? else {
        state
            .store
            .delete_state(&code)
            .await
            .map_err(|e| ApiError::storage(WRITE_FAILED, e))?;

        info!(workout_code = %code, "workout state cleared");

        return Ok(Json(SetStateResponse {
            success: true,
            message: format!("Workout state cleared for code: {code}"),
            start_date_time: None,
        }));
    };

    let workout_state = parse_workout_state(&body).inspect_err(|e| {
        tracing::warn!(workout_code = %code, error = %e, "rejected workout state body");
    })?;

    let now = Utc::now().timestamp();
    let record = WorkoutStateRecord::new(&code, workout_state, now);

    state
        .store
        .put_state(&record)
        .await
        .map_err(|e| ApiError::storage(WRITE_FAILED, e))?;

    info!(workout_code = %code, ttl = record.ttl, "workout state updated");

    Ok(Json(SetStateResponse {
        success: true,
        message: format!("Workout state updated for code: {code}"),
        start_date_time: Some(record.state.start_date_time),
    }))
}

/// POST /workout-state/{workout_code}/
///
/// The API key segment is empty.
pub async fn missing_api_key_handler() -> ApiError {
    ApiError::Unauthorized("api_key is required".to_string())
}

/// Decode a request body. `None` means "clear": no body, whitespace only, or
/// the JSON literal `null`.
fn parse_body(body: &[u8]) -> Result<Option<Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match serde_json::from_slice(body) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(ApiError::BadRequest(format!("Error parsing JSON body: {e}"))),
    }
}
