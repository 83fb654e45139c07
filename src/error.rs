// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized: no valid session
    Unauthenticated(String),

    // 401 Unauthorized: valid session, wrong role
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // Upstream data API answered with a non-success status
    Upstream { status: u16, body: Value },

    // 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            // Both guard rejections read the same to the client
            ApiError::Unauthenticated(_) | ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::NotFound(msg) => msg,
            ApiError::Upstream { .. } => "Upstream request failed",
            ApiError::Internal(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Upstream { .. } => "UPSTREAM_FAILURE",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Upstream { body, .. } => json!({
                "success": false,
                "error": self.message(),
                "code": self.error_code(),
                "details": body
            }),
            _ => json!({
                "success": false,
                "error": self.message(),
                "code": self.error_code()
            }),
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream(status: u16, body: Value) -> Self {
        ApiError::Upstream { status, body }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

/// Every backing-source failure, a missing record included, is a logged 500.
/// Routes that read the data sources never answer 404.
impl From<crate::data::DataError> for ApiError {
    fn from(err: crate::data::DataError) -> Self {
        // Don't expose backing store details to clients
        tracing::error!("Data source error: {}", err);
        ApiError::internal("An error occurred while processing your request")
    }
}

impl From<crate::services::upstream::UpstreamError> for ApiError {
    fn from(err: crate::services::upstream::UpstreamError) -> Self {
        use crate::services::upstream::UpstreamError;

        match err {
            UpstreamError::Status { status, body } => {
                let status = if (400..=599).contains(&status) { status } else { 502 };
                ApiError::upstream(status, body)
            }
            other => {
                tracing::error!("Upstream transport error: {}", other);
                ApiError::internal("Failed to reach data service")
            }
        }
    }
}

impl From<crate::auth::SessionError> for ApiError {
    fn from(err: crate::auth::SessionError) -> Self {
        use crate::auth::SessionError;

        match err {
            SessionError::Invalid(msg) => ApiError::unauthenticated(msg),
            other => {
                tracing::error!("Session error: {}", other);
                ApiError::internal("Failed to issue session")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejections_share_unauthorized_body() {
        let missing = ApiError::unauthenticated("no session");
        let wrong = ApiError::unauthorized("role mismatch");

        assert_eq!(missing.status_code(), 401);
        assert_eq!(wrong.status_code(), 401);
        assert_eq!(missing.to_json()["error"], "Unauthorized");
        assert_eq!(wrong.to_json()["error"], "Unauthorized");
    }

    #[test]
    fn upstream_error_keeps_status_and_body() {
        let err = ApiError::upstream(503, json!({ "error": "maintenance" }));
        assert_eq!(err.status_code(), 503);

        let body = err.to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["details"]["error"], "maintenance");
    }

    #[test]
    fn internal_errors_stay_generic() {
        let err: ApiError = crate::data::DataError::Unavailable("pool timed out on 10.0.0.4".into()).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("10.0.0.4"));
    }

    #[test]
    fn missing_source_record_is_internal_not_404() {
        let err: ApiError = crate::data::DataError::NotFound("no xp for ghost@example.com".into()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "INTERNAL_SERVER_ERROR");
    }
}
