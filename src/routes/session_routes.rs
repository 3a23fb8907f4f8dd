//! Session state endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::models::AuthState;
use crate::state::AppState;

/// Registers session routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/session", get(current).put(publish))
}

async fn current(State(state): State<AppState>) -> Json<AuthState> {
    Json(state.session.snapshot())
}

/// Publishes a credential event from the frontend shell.
async fn publish(State(state): State<AppState>, Json(auth): Json<AuthState>) -> StatusCode {
    info!(
        event_name = "session.published",
        event_domain = "session",
        user_present = auth.user.is_some(),
        loading = auth.loading,
        "auth state published"
    );
    state.session.replace(auth);
    StatusCode::NO_CONTENT
}
