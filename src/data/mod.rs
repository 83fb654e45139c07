// data/mod.rs - Injected data access for dashboards and gamification
//
// Handlers never talk to a store directly. They go through the `SchoolData`
// trait, and the backend behind it is chosen once at startup from
// `DATA_SOURCE`: fixture (YAML), api (external HTTP data API) or postgres.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AppConfig, DataSourceKind};

pub mod api;
pub mod fixture;
pub mod models;
pub mod postgres;

pub use models::{Activity, Event, StoredBadge, StoredXp, StudentSummary};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    #[error("Data API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode data: {0}")]
    Decode(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Read access to everything the portal dashboards need
#[async_trait]
pub trait SchoolData: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    async fn linked_students(&self, parent_id: &str) -> Result<Vec<StudentSummary>, DataError>;

    /// Activities in source order (newest first by convention)
    async fn recent_activities(&self, parent_id: &str) -> Result<Vec<Activity>, DataError>;

    /// Events in source order (soonest first by convention)
    async fn upcoming_events(&self, parent_id: &str) -> Result<Vec<Event>, DataError>;

    async fn unread_message_count(&self, parent_id: &str) -> Result<u32, DataError>;

    async fn student_xp(&self, email: &str) -> Result<StoredXp, DataError>;

    async fn student_badges(&self, email: &str) -> Result<Vec<StoredBadge>, DataError>;

    async fn health_check(&self) -> Result<(), DataError>;
}

/// Build the configured backend. Fixture data is passed in when it has
/// already been loaded so it is only parsed once.
pub async fn connect(
    config: &AppConfig,
    fixtures: Option<fixture::FixtureSet>,
) -> anyhow::Result<Arc<dyn SchoolData>> {
    let data: Arc<dyn SchoolData> = match config.data.source {
        DataSourceKind::Fixture => {
            let set = match fixtures {
                Some(set) => set,
                None => fixture::FixtureSet::load(config.data.fixture_path.as_deref())?,
            };
            Arc::new(fixture::FixtureData::new(set))
        }
        DataSourceKind::Api => Arc::new(api::ApiData::new(&config.upstream)?),
        DataSourceKind::Postgres => {
            let url = config
                .data
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required when DATA_SOURCE=postgres"))?;
            Arc::new(postgres::PgData::connect(url, config.data.max_connections).await?)
        }
    };

    tracing::info!("Using '{}' data source", data.name());
    Ok(data)
}
