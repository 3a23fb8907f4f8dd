//! HTTP route definitions and handlers.
//!
//! Routes are grouped by concern: guard evaluation, session state, cache
//! lifecycle and background events, health checks. Anything else falls
//! through to the caching proxy.

mod cache_routes;
mod guard_routes;
mod health_routes;
mod proxy;
mod session_routes;

use crate::state::AppState;
use axum::Router;

/// Creates the application router with all configured routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(guard_routes::routes())
        .merge(session_routes::routes())
        .merge(cache_routes::routes())
        .merge(health_routes::routes())
        .fallback(proxy::proxy)
        .with_state(state)
}
