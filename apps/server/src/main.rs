//! HTTP entry point for the monday.com column auto-format integration.
//!
//! ```text
//! GET  /install          -> redirect to the platform's authorize page
//! GET  /auth/callback    -> exchange the code, persist the account, redirect
//! POST /webhooks/events  -> HMAC-gated automation lifecycle events
//! ```

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use maf_core::{AppConfig, IntegrationStore, MondayClient, PlatformApi, SqliteStore};

mod events;
mod oauth;
#[cfg(test)]
mod testutil;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn IntegrationStore>,
    pub api: Arc<dyn PlatformApi>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/install", get(oauth::install))
        .route("/auth/callback", get(oauth::callback))
        .route("/webhooks/events", post(events::handle_event))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env()?;
    let db_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| "autoformat.db".into());
    let store: Arc<dyn IntegrationStore> = Arc::new(SqliteStore::open(&db_path)?);
    let api: Arc<dyn PlatformApi> = Arc::new(MondayClient::new(&config)?);
    let state = AppState {
        config: Arc::new(config),
        store,
        api,
    };

    let addr: std::net::SocketAddr = std::env::var("BIND")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()?;
    tracing::info!(%addr, db = %db_path, "autoformat server listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app(state)).await?;
    Ok(())
}
