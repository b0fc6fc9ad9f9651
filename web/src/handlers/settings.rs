//! Settings endpoints.
//!
//! - `GET /api/settings` - public
//! - `PUT /api/settings` - administrators, partial update

use crate::error::AppError;
use crate::extractors::{ApiJson, Authenticated};
use crate::state::AppState;
use axum::{extract::State, Json};
use fieldbook_core::{Settings, SettingsPatch};

/// Current settings, created with defaults on first access.
///
/// # Errors
///
/// 503 when the store fails.
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.settings.get().await?))
}

/// Apply a partial update. Absent fields keep their current value.
///
/// # Example
///
/// ```bash
/// curl -X PUT http://localhost:8080/api/settings \
///   -H "Authorization: Bearer $ADMIN_TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{"blocked_slots": {"2026-02-25": ["19:00", "20:00"]}}'
/// ```
///
/// # Errors
///
/// 401 without a valid token, 403 for non-administrators, 422 for a
/// malformed patch.
pub async fn update_settings(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiJson(patch): ApiJson<SettingsPatch>,
) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.settings.update(patch, &actor).await?))
}
