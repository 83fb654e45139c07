use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

use crate::auth::{Session, SESSION_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

/// Decode the session token (if any) and attach the `Session` to the request.
///
/// Never rejects: a missing or invalid token just leaves the request without
/// a session, and the route guards decide what that means.
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_token(request.headers()) {
        match state.sessions.validate(&token) {
            Ok(session) => {
                tracing::debug!("Session for {} ({})", session.email, session.role);
                request.extensions_mut().insert(session);
            }
            Err(e) => tracing::debug!("Ignoring session token: {}", e),
        }
    }

    next.run(request).await
}

/// Bearer token first, then the session cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|raw| Cookie::split_parse(raw).filter_map(Result::ok))
        .find(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// Extractor for handlers behind a guard; 401 when no session is attached
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| ApiError::unauthenticated("Authentication required"))
    }
}
