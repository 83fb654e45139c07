use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentSession};
use crate::notifications::Toast;
use crate::state::AppState;

/// GET /api/notifications - the caller's toasts, newest first
pub async fn list_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> ApiResponse<Vec<Toast>> {
    ApiResponse::success(state.toasts.list(&session.user_id))
}

/// POST /api/notifications/:id/dismiss - close a toast; it is removed after a delay
pub async fn dismiss_post(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    if !state.toasts.dismiss(&session.user_id, &id) {
        return Err(ApiError::not_found(format!("Notification '{}' not found", id)));
    }

    Ok(ApiResponse::success(json!({ "id": id, "open": false })))
}
