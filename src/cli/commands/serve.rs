use crate::config::config;
use crate::server;
use crate::state::AppState;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config().clone();
    tracing::info!("Starting school portal API in {:?} mode", config.environment);

    if crate::is_development!() {
        tracing::debug!(
            "Data source {:?}, identity provider {:?}, upstream {}",
            config.data.source,
            config.security.identity_provider,
            config.upstream.api_url
        );
    }

    let port = port.unwrap_or(config.server.port);
    let state = AppState::from_config(config).await?;

    server::serve(state, port).await
}
