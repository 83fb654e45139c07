use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::auth::{require_role, require_session, Access, RejectReason, Role, Session};
use crate::error::ApiError;

/// Where unauthenticated page requests are sent
pub const SIGN_IN_PATH: &str = "/auth/signin";

fn log_rejection(path: &str, reason: RejectReason) {
    match reason {
        RejectReason::Unauthenticated => tracing::debug!("Rejected {}: no session", path),
        RejectReason::WrongRole { expected, actual } => {
            tracing::debug!("Rejected {}: role {} required, session has {}", path, expected, actual)
        }
    }
}

fn rejection_error(reason: RejectReason) -> ApiError {
    match reason {
        RejectReason::Unauthenticated => ApiError::unauthenticated("Authentication required"),
        RejectReason::WrongRole { expected, .. } => {
            ApiError::unauthorized(format!("{} role required", expected))
        }
    }
}

/// API guard: 401 JSON unless the session role equals the route's role.
///
/// Mount with `from_fn_with_state(Role::Parent, require_role_api)`.
pub async fn require_role_api(State(role): State<Role>, request: Request, next: Next) -> Response {
    let access = require_role(request.extensions().get::<Session>(), role);

    match access {
        Access::Allow => next.run(request).await,
        Access::Reject(reason) => {
            log_rejection(request.uri().path(), reason);
            rejection_error(reason).into_response()
        }
    }
}

/// API guard for routes open to every signed-in role
pub async fn require_session_api(request: Request, next: Next) -> Response {
    match require_session(request.extensions().get::<Session>()) {
        Access::Allow => next.run(request).await,
        Access::Reject(reason) => {
            log_rejection(request.uri().path(), reason);
            rejection_error(reason).into_response()
        }
    }
}

/// Page guard: same decision as the API guard, answered with a redirect
/// to the sign-in page carrying the original path as `callbackUrl`.
pub async fn require_role_page(State(role): State<Role>, request: Request, next: Next) -> Response {
    let access = require_role(request.extensions().get::<Session>(), role);

    match access {
        Access::Allow => next.run(request).await,
        Access::Reject(reason) => {
            let path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            log_rejection(path, reason);
            Redirect::to(&sign_in_redirect(path)).into_response()
        }
    }
}

pub fn sign_in_redirect(callback: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("callbackUrl", callback)
        .finish();
    format!("{}?{}", SIGN_IN_PATH, query)
}
