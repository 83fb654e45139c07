use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::CurrentSession;
use crate::notifications::{NewToast, ToastVariant};
use crate::services::gamification::{evaluate_badges, Badge, BadgeFilter, XpRecord};
use crate::services::student_dashboard;
use crate::state::AppState;

/// GET /api/student/dashboard - forwarded from the upstream data API
pub async fn dashboard_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Value>, ApiError> {
    let payload = student_dashboard(&state.upstream, &session.email).await?;
    Ok(Json(payload))
}

/// GET /api/student/xp
pub async fn xp_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<XpRecord>, ApiError> {
    let stored = state.data.student_xp(&session.email).await?;
    Ok(Json(XpRecord::from(stored)))
}

#[derive(Debug, Deserialize)]
pub struct BadgeQuery {
    pub category: Option<String>,
}

/// GET /api/student/badges?category= - badges with state and progress
///
/// Badges that reach Earned during evaluation are announced once per user.
pub async fn badges_get(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<BadgeQuery>,
) -> Result<Json<Vec<Badge>>, ApiError> {
    let filter = match query.category.as_deref() {
        Some(raw) => raw
            .parse::<BadgeFilter>()
            .map_err(|e| ApiError::bad_request(e.to_string()))?,
        None => BadgeFilter::All,
    };

    let stored = state.data.student_badges(&session.email).await?;
    let evaluation = evaluate_badges(stored);

    for badge in &evaluation.newly_earned {
        let toast = NewToast::new(format!("Badge earned: {}", badge.name))
            .variant(ToastVariant::Success)
            .once(format!("badge:{}", badge.id));
        let toast = match &badge.description {
            Some(description) => toast.description(description.clone()),
            None => toast,
        };
        state.toasts.add(&session.user_id, toast);
    }

    Ok(Json(filter.apply(evaluation.badges)))
}
