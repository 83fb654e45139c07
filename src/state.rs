use std::sync::Arc;
use std::time::Duration;

use crate::auth::identity::{FixtureIdentity, NoIdentity};
use crate::auth::{IdentityProvider, SessionKeys};
use crate::config::{AppConfig, DataSourceKind, IdentityProviderKind};
use crate::data::{self, fixture::FixtureSet, SchoolData};
use crate::notifications::ToastStore;
use crate::services::UpstreamClient;

/// Shared, cheaply cloneable application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionKeys,
    pub identity: Arc<dyn IdentityProvider>,
    pub data: Arc<dyn SchoolData>,
    pub upstream: UpstreamClient,
    pub toasts: ToastStore,
}

impl AppState {
    /// Wire every collaborator from configuration
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let needs_fixtures = config.data.source == DataSourceKind::Fixture
            || config.security.identity_provider == IdentityProviderKind::Fixture;
        let fixtures = if needs_fixtures {
            Some(FixtureSet::load(config.data.fixture_path.as_deref())?)
        } else {
            None
        };

        let identity: Arc<dyn IdentityProvider> = match config.security.identity_provider {
            IdentityProviderKind::None => Arc::new(NoIdentity),
            IdentityProviderKind::Fixture => {
                let users = fixtures.as_ref().map(|f| f.users.clone()).unwrap_or_default();
                Arc::new(FixtureIdentity::new(users))
            }
        };
        tracing::info!("Using '{}' identity provider", identity.name());

        let data = data::connect(&config, fixtures).await?;
        Self::new(config, identity, data)
    }

    /// Assemble state around explicit collaborators
    pub fn new(
        config: AppConfig,
        identity: Arc<dyn IdentityProvider>,
        data: Arc<dyn SchoolData>,
    ) -> anyhow::Result<Self> {
        let sessions = SessionKeys::from_config(&config.security);
        let upstream = UpstreamClient::new(&config.upstream)?;
        let toasts = ToastStore::new(
            config.notifications.toast_limit,
            Duration::from_millis(config.notifications.toast_remove_delay_ms),
        );

        Ok(Self {
            config: Arc::new(config),
            sessions,
            identity,
            data,
            upstream,
            toasts,
        })
    }
}
