use axum::{extract::State, Json};

use crate::error::ApiError;
use crate::middleware::CurrentSession;
use crate::services::{parent_dashboard, ParentDashboard};
use crate::state::AppState;

/// GET /api/parent/dashboard - stats, linked students, activities and events
pub async fn dashboard_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ParentDashboard>, ApiError> {
    let dashboard = parent_dashboard(state.data.as_ref(), &session.user_id).await?;
    Ok(Json(dashboard))
}
