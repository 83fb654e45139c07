use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Invalid upstream base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Upstream returned {status}")]
    Status { status: u16, body: Value },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode upstream response: {0}")]
    Decode(String),
}

/// Client for the external data API that owns student dashboards
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base: Url,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| UpstreamError::InvalidBaseUrl(format!("{}: {}", config.api_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(UpstreamError::InvalidBaseUrl(config.api_url.clone()));
        }

        // No timeout unless configured; the transport default applies
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `${API_URL}/student/dashboard?email=<email>`
    pub fn student_dashboard_url(&self, email: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["student", "dashboard"]);
        }
        url.query_pairs_mut().append_pair("email", email);
        url
    }

    /// Fetch the student dashboard, forwarding the upstream JSON unchanged.
    /// Non-success statuses come back as `UpstreamError::Status` with the body.
    pub async fn student_dashboard(&self, email: &str) -> Result<Value, UpstreamError> {
        let url = self.student_dashboard_url(email);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!(
                "Student dashboard upstream returned {}: {}",
                status.as_u16(),
                text
            );
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}
