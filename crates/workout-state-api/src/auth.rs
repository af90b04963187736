use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use tracing::warn;
use workout_state_core::{WorkoutCode, WorkoutStore};

use crate::errors::{ApiError, WRITE_FAILED};
use crate::state::AppState;

/// A workout code whose API key, taken from the
/// `/workout-state/{workout_code}/{api_key}` path, has been verified.
/// Runs from request parts, before any body extractor.
pub struct AuthorizedCode(pub WorkoutCode);

impl FromRequestParts<AppState> for AuthorizedCode {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path((code, api_key)) = Path::<(String, String)>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let code = WorkoutCode::from(code);
        authorize(state.store.as_ref(), &code, &api_key).await?;

        Ok(AuthorizedCode(code))
    }
}

/// Check `supplied` against the API key provisioned for `code`.
pub async fn authorize(
    store: &dyn WorkoutStore,
    code: &WorkoutCode,
    supplied: &str,
) -> Result<(), ApiError> {
    if supplied.is_empty() {
        return Err(ApiError::Unauthorized("api_key is required".to_string()));
    }

    let record = store
        .get_api_key(code)
        .await
        .map_err(|e| ApiError::storage(WRITE_FAILED, e))?
        .ok_or_else(|| {
            warn!(workout_code = %code, "write attempted without a configured API key");
            ApiError::Unauthorized("Invalid workout code or API key not configured".to_string())
        })?;

    if !keys_match(&record.api_key, supplied) {
        warn!(workout_code = %code, "rejected invalid API key");
        return Err(ApiError::Unauthorized("Invalid API key".to_string()));
    }

    Ok(())
}

/// Exact key equality. Empty keys never match, and equal-length keys are
/// compared without an early exit.
pub fn keys_match(stored: &str, supplied: &str) -> bool {
    if stored.is_empty() || supplied.is_empty() || stored.len() != supplied.len() {
        return false;
    }

    stored
        .bytes()
        .zip(supplied.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
