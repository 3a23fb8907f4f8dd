//! Application startup and server initialization.
//!
//! Builds the session context, guards, and offline cache, warms the cache,
//! and serves the router on the configured address.

use std::sync::Arc;

use reqwest::Url;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cache::{Fetcher, OfflineCache, ReqwestFetcher};
use crate::config::ConfigV1;
use crate::guards::GuardSet;
use crate::routes;
use crate::session::SessionContext;
use crate::state::AppState;

/// Build the shared state around a given network fetcher.
pub fn build_state(
    config: Arc<ConfigV1>,
    fetcher: Arc<dyn Fetcher>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let origin = Url::parse(&config.cache.upstream)?;
    let cache = OfflineCache::new(config.cache.clone(), origin, fetcher);

    Ok(AppState {
        guards: Arc::new(GuardSet::new(&config)),
        session: SessionContext::default(),
        cache: Arc::new(cache),
        config,
    })
}

/// Initializes and runs the application server.
///
/// Precaches the static manifest (a failed install is logged and the
/// server starts anyway, serving straight from the network), activates the
/// current stores, then binds and serves.
///
/// # Errors
///
/// Returns an error if the upstream URL is invalid, the server fails to
/// bind to the specified address, or encounters a runtime error.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn std::error::Error>> {
    let origin = Url::parse(&config.cache.upstream)?;
    let fetcher = Arc::new(ReqwestFetcher::new(origin));
    let state = build_state(config.clone(), fetcher)?;

    if let Err(e) = state.cache.install().await {
        warn!("Cache install failed, continuing without precache: {}", e);
    }
    let deleted = state.cache.activate();
    info!(deleted = deleted.len(), "Cache activated");

    info!("Starting server on {}", config.bind_address);
    let app = routes::create_router(state);
    let listener = TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
