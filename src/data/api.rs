use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::{Activity, DataError, Event, SchoolData, StoredBadge, StoredXp, StudentSummary};
use crate::config::UpstreamConfig;

/// Backend reading dashboard data from the external data API (API_URL)
pub struct ApiData {
    client: reqwest::Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
struct UnreadCount {
    count: u32,
}

impl ApiData {
    pub fn new(config: &UpstreamConfig) -> Result<Self, DataError> {
        let base = Url::parse(&config.api_url)
            .map_err(|e| DataError::Unavailable(format!("invalid API_URL '{}': {}", config.api_url, e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base,
        })
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, DataError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DataError::Unavailable(format!("API_URL '{}' cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, DataError> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::NotFound(format!("{} returned 404", url.path())));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Data API {} returned {}: {}", url.path(), status.as_u16(), body);
            return Err(DataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DataError::Decode(format!("{}: {}", url.path(), e)))
    }
}

#[async_trait]
impl SchoolData for ApiData {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn linked_students(&self, parent_id: &str) -> Result<Vec<StudentSummary>, DataError> {
        self.get_json(self.url(&["parents", parent_id, "students"], &[])?).await
    }

    async fn recent_activities(&self, parent_id: &str) -> Result<Vec<Activity>, DataError> {
        self.get_json(self.url(&["parents", parent_id, "activities"], &[])?).await
    }

    async fn upcoming_events(&self, parent_id: &str) -> Result<Vec<Event>, DataError> {
        self.get_json(self.url(&["parents", parent_id, "events"], &[])?).await
    }

    async fn unread_message_count(&self, parent_id: &str) -> Result<u32, DataError> {
        let unread: UnreadCount = self
            .get_json(self.url(&["parents", parent_id, "messages", "unread"], &[])?)
            .await?;
        Ok(unread.count)
    }

    async fn student_xp(&self, email: &str) -> Result<StoredXp, DataError> {
        self.get_json(self.url(&["students", "xp"], &[("email", email)])?).await
    }

    async fn student_badges(&self, email: &str) -> Result<Vec<StoredBadge>, DataError> {
        self.get_json(self.url(&["students", "badges"], &[("email", email)])?).await
    }

    async fn health_check(&self) -> Result<(), DataError> {
        let url = self.url(&["health"], &[])?;
        let response = self.client.get(url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(DataError::Unavailable(format!("data API health returned {}", response.status())))
        }
    }
}
