use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Secret used only when running in development without SESSION_SECRET
const DEVELOPMENT_SESSION_SECRET: &str = "school-portal-development-secret";

/// Longest session lifetime accepted from the environment (one year)
pub const MAX_SESSION_EXPIRY_HOURS: u64 = 24 * 365;

fn parse_expiry_hours(raw: &str, fallback: u64) -> u64 {
    let hours = raw.trim().parse().unwrap_or(fallback);
    if hours > MAX_SESSION_EXPIRY_HOURS {
        tracing::warn!(
            "SESSION_EXPIRY_HOURS {} exceeds {}, clamping",
            hours,
            MAX_SESSION_EXPIRY_HOURS
        );
    }
    hours.min(MAX_SESSION_EXPIRY_HOURS)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub data: DataConfig,
    pub security: SecurityConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the external data API (API_URL)
    pub api_url: String,
    /// None keeps the transport default
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Fixture,
    Api,
    Postgres,
}

impl DataSourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixture" | "mock" => Some(DataSourceKind::Fixture),
            "api" | "http" => Some(DataSourceKind::Api),
            "postgres" | "pg" => Some(DataSourceKind::Postgres),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub source: DataSourceKind,
    pub fixture_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProviderKind {
    /// No identity backend wired: every sign-in is "no match"
    None,
    Fixture,
}

impl IdentityProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Some(IdentityProviderKind::None),
            "fixture" | "mock" => Some(IdentityProviderKind::Fixture),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub session_secret: String,
    pub session_expiry_hours: u64,
    pub session_cookie_secure: bool,
    pub identity_provider: IdentityProviderKind,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub toast_limit: usize,
    pub toast_remove_delay_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("PORTAL_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Upstream overrides
        if let Ok(v) = env::var("API_URL") {
            if !v.trim().is_empty() {
                self.upstream.api_url = v.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(v) = env::var("UPSTREAM_TIMEOUT_SECS") {
            self.upstream.timeout_secs = v.parse().ok();
        }

        // Data overrides
        if let Ok(v) = env::var("DATA_SOURCE") {
            match DataSourceKind::parse(&v) {
                Some(kind) => self.data.source = kind,
                None => tracing::warn!("Ignoring unknown DATA_SOURCE '{}'", v),
            }
        }
        if let Ok(v) = env::var("FIXTURE_PATH") {
            self.data.fixture_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.data.database_url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.data.max_connections = v.parse().unwrap_or(self.data.max_connections);
        }

        // Security overrides
        if let Ok(v) = env::var("SESSION_SECRET") {
            self.security.session_secret = v;
        }
        if let Ok(v) = env::var("SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours = parse_expiry_hours(&v, self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("SESSION_COOKIE_SECURE") {
            self.security.session_cookie_secure = v.parse().unwrap_or(self.security.session_cookie_secure);
        }
        if let Ok(v) = env::var("AUTH_PROVIDER") {
            match IdentityProviderKind::parse(&v) {
                Some(kind) => self.security.identity_provider = kind,
                None => tracing::warn!("Ignoring unknown AUTH_PROVIDER '{}'", v),
            }
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Notification overrides
        if let Ok(v) = env::var("TOAST_LIMIT") {
            self.notifications.toast_limit = v.parse().unwrap_or(self.notifications.toast_limit);
        }
        if let Ok(v) = env::var("TOAST_REMOVE_DELAY_MS") {
            self.notifications.toast_remove_delay_ms =
                v.parse().unwrap_or(self.notifications.toast_remove_delay_ms);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
            },
            upstream: UpstreamConfig {
                api_url: "http://localhost:3333".to_string(),
                timeout_secs: None,
            },
            data: DataConfig {
                source: DataSourceKind::Fixture,
                fixture_path: None,
                database_url: None,
                max_connections: 5,
            },
            security: SecurityConfig {
                session_secret: DEVELOPMENT_SESSION_SECRET.to_string(),
                session_expiry_hours: 24 * 7, // 1 week
                session_cookie_secure: false,
                identity_provider: IdentityProviderKind::Fixture,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            notifications: NotificationConfig {
                toast_limit: 5,
                toast_remove_delay_ms: 5_000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
            },
            upstream: UpstreamConfig {
                api_url: "http://localhost:3333".to_string(),
                timeout_secs: None,
            },
            data: DataConfig {
                source: DataSourceKind::Api,
                fixture_path: None,
                database_url: None,
                max_connections: 10,
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_expiry_hours: 24,
                session_cookie_secure: true,
                identity_provider: IdentityProviderKind::None,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            notifications: NotificationConfig {
                toast_limit: 5,
                toast_remove_delay_ms: 5_000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: false,
            },
            upstream: UpstreamConfig {
                api_url: "http://localhost:3333".to_string(),
                timeout_secs: None,
            },
            data: DataConfig {
                source: DataSourceKind::Api,
                fixture_path: None,
                database_url: None,
                max_connections: 20,
            },
            security: SecurityConfig {
                session_secret: String::new(),
                session_expiry_hours: 8,
                session_cookie_secure: true,
                identity_provider: IdentityProviderKind::None,
                cors_origins: vec!["https://portal.example.com".to_string()],
            },
            notifications: NotificationConfig {
                toast_limit: 3,
                toast_remove_delay_ms: 5_000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
