//! Guard evaluation endpoints.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::guards::GuardContext;
use crate::models::{AuthState, GuardDecision, Redirect};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Registers guard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guards/protected/escape", post(escape))
        .route("/guards/:name", post(evaluate))
}

#[derive(Deserialize)]
struct EvaluateRequest {
    auth: AuthState,
    context: GuardContext,
}

/// Evaluates the named guard against a posted auth state.
async fn evaluate(
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<GuardDecision>, HTTPError> {
    let guard = state
        .guards
        .by_name(&name)
        .ok_or_else(|| HTTPError::new(StatusCode::NOT_FOUND, format!("Unknown guard '{}'", name)))?;
    Ok(Json(guard.evaluate(&request.auth, &request.context)))
}

#[derive(Deserialize)]
struct EscapeRequest {
    path: String,
    elapsed_ms: u64,
}

/// The manual "back to sign-in" escape of the loading screen.
async fn escape(
    State(state): State<AppState>,
    Json(request): Json<EscapeRequest>,
) -> Result<Json<Redirect>, HTTPError> {
    state
        .guards
        .protected
        .escape(&request.path, Duration::from_millis(request.elapsed_ms))
        .map(Json)
        .ok_or_else(|| HTTPError::new(StatusCode::CONFLICT, "Escape is not available yet"))
}
