//! ladder-gateway server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ladder_gateway::api;
use ladder_gateway::app_state::AppState;
use ladder_gateway::config::{GatewayConfig, LogFormat, StoreBackend};
use ladder_gateway::persistence::{EntityStore, MemoryStore, PostgresStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting ladder-gateway");

    // Build persistence layer
    let store: Arc<dyn EntityStore> = match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => Arc::new(
            PostgresStore::connect(&config)
                .await
                .context("connecting to postgres")?,
        ),
    };
    if config.auth_jwt_secret.is_none() {
        tracing::warn!("AUTH_JWT_SECRET not set; bearer tokens will be rejected");
    }

    // Build application state and router
    let app_state = AppState::from_config(&config, store);
    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
