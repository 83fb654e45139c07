use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::Role;
use crate::config::SecurityConfig;
use crate::handlers::{pages, protected, public};
use crate::middleware::{require_role_api, require_role_page, require_session_api, session_middleware};
use crate::state::AppState;

/// Build the full router around the given state
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        // Guarded API
        .merge(parent_routes())
        .merge(student_routes())
        .merge(notification_routes())
        // Guarded pages
        .merge(page_routes())
        // Session decoding runs before every guard
        .layer(from_fn_with_state(state.clone(), session_middleware))
        .layer(cors_layer(&state.config.security));

    if state.config.server.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

/// Bind and serve until Ctrl-C, then drain the notification store
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let toasts = state.toasts.clone();
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("School portal API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    toasts.shutdown();
    tracing::info!("Server stopped");
    Ok(())
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/signin", post(auth::signin_post))
        .route("/api/auth/session", get(auth::session_get))
        .route("/api/auth/signout", post(auth::signout_post))
}

fn parent_routes() -> Router<AppState> {
    use protected::parent;

    Router::new()
        .route("/api/parent/dashboard", get(parent::dashboard_get))
        .route_layer(from_fn_with_state(Role::Parent, require_role_api))
}

fn student_routes() -> Router<AppState> {
    use protected::student;

    Router::new()
        .route("/api/student/dashboard", get(student::dashboard_get))
        .route("/api/student/xp", get(student::xp_get))
        .route("/api/student/badges", get(student::badges_get))
        .route_layer(from_fn_with_state(Role::Student, require_role_api))
}

fn notification_routes() -> Router<AppState> {
    use protected::notifications;

    Router::new()
        .route("/api/notifications", get(notifications::list_get))
        .route("/api/notifications/:id/dismiss", post(notifications::dismiss_post))
        .route_layer(from_fn(require_session_api))
}

fn page_routes() -> Router<AppState> {
    let parent = Router::new()
        .route("/dashboard/parent", get(pages::parent_dashboard_page))
        .route_layer(from_fn_with_state(Role::Parent, require_role_page));

    let student = Router::new()
        .route("/dashboard/student", get(pages::student_dashboard_page))
        .route_layer(from_fn_with_state(Role::Student, require_role_page));

    Router::new()
        .route("/auth/signin", get(pages::signin_page))
        .merge(parent)
        .merge(student)
}

/// Permissive unless origins are configured; configured origins may send cookies
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "School Portal API",
            "version": version,
            "description": "Sessions, role guards, dashboards and gamification for the school portal",
            "endpoints": {
                "auth": "/api/auth/signin, /api/auth/session, /api/auth/signout (public)",
                "parent": "/api/parent/dashboard (PARENT)",
                "student": "/api/student/dashboard, /api/student/xp, /api/student/badges (STUDENT)",
                "notifications": "/api/notifications[/:id/dismiss] (any session)",
                "pages": "/dashboard/parent (PARENT), /dashboard/student (STUDENT), /auth/signin",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let source = state.data.name();

    match state.data.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "dataSource": source
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check against '{}' failed: {}", source, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "data source unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "dataSource": source
                    }
                })),
            )
        }
    }
}
