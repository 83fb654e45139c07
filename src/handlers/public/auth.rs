// handlers/public/auth.rs - POST /api/auth/signin, GET /api/auth/session, POST /api/auth/signout

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::auth::cookies::{clear_session_cookie, session_cookie};
use crate::auth::{IssuedToken, Session};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::notifications::{NewToast, ToastVariant};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/signin - verify credentials and issue a session token
///
/// The token is returned in the body and also set as the `portal_session`
/// cookie so browser requests carry it automatically.
pub async fn signin_post(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<IssuedToken> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let email = request.email.as_deref().map(str::trim).unwrap_or_default();
    let password = request.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let identity = state
        .identity
        .verify(email, password)
        .await
        .map_err(|e| {
            tracing::error!("Identity provider '{}' failed: {:#}", state.identity.name(), e);
            ApiError::internal("Failed to verify credentials")
        })?
        .ok_or_else(|| {
            tracing::info!("Failed sign-in for '{}'", email);
            ApiError::unauthenticated("Invalid credentials")
        })?;

    let issued = state.sessions.issue(&identity)?;
    tracing::info!("Signed in {} as {}", issued.session.email, issued.session.role);

    state.toasts.add(
        &issued.session.user_id,
        NewToast::new(format!("Welcome back, {}", issued.session.name)).variant(ToastVariant::Success),
    );

    let cookie = session_cookie(
        &issued.token,
        state.sessions.expiry_hours(),
        state.config.security.session_cookie_secure,
    );
    Ok(ApiResponse::success(issued).with_cookie(cookie))
}

/// GET /api/auth/session - the caller's session, or `null`
pub async fn session_get(session: Option<Extension<Session>>) -> ApiResponse<Option<Session>> {
    ApiResponse::success(session.map(|Extension(session)| session))
}

/// POST /api/auth/signout - expire the session cookie
///
/// Tokens are stateless; a bearer token stays valid until it expires.
pub async fn signout_post(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
) -> ApiResponse<serde_json::Value> {
    if let Some(Extension(session)) = &session {
        tracing::info!("Signed out {}", session.email);
    }

    ApiResponse::success(serde_json::json!({ "signedOut": true }))
        .with_cookie(clear_session_cookie(state.config.security.session_cookie_secure))
}
