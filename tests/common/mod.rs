#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use reqwest::StatusCode;
use serde_json::{json, Value};

use school_portal_api::config::AppConfig;
use school_portal_api::server;
use school_portal_api::state::AppState;

/// Password shared by every fixture account
pub const DEMO_PASSWORD: &str = "portal-demo";

pub const PARENT_EMAIL: &str = "jordan.parent@example.com";
pub const STUDENT_EMAIL: &str = "avery.rivera@example.com";
pub const TEACHER_EMAIL: &str = "m.chen@example.com";
pub const ADMIN_EMAIL: &str = "office@example.com";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub state: AppState,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Development config pointed at `api_url`, with fast toast removal
pub fn test_config(api_url: &str) -> AppConfig {
    let mut config = AppConfig::development();
    config.upstream.api_url = api_url.to_string();
    config.server.enable_request_logging = false;
    config.security.session_secret = "integration-test-secret".to_string();
    config.notifications.toast_remove_delay_ms = 50;
    config
}

/// Start the app on a free port inside the current test runtime
pub async fn spawn_server(config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let state = AppState::from_config(config).await?;
    let app = server::app(state.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let server = TestServer { port, base_url, state };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

/// App on fixture data with an upstream that is never reachable
pub async fn ensure_server() -> Result<TestServer> {
    spawn_server(test_config("http://127.0.0.1:9")).await
}

/// Serve an arbitrary router (a fake upstream) and return its base URL
pub async fn spawn_fake(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

/// Sign in with the demo password and return the bearer token
pub async fn sign_in(server: &TestServer, email: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/signin"))
        .json(&json!({ "email": email, "password": DEMO_PASSWORD }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "sign-in for {} failed: {}", email, res.status());

    let body: Value = res.json().await?;
    body["data"]["token"]
        .as_str()
        .map(str::to_string)
        .context("sign-in response has no token")
}

/// Client that does not follow redirects, for page guard checks
pub fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client")
}
