//! Cache lifecycle and background event endpoints.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cache::{ClientWindow, Notification, SyncOutcome};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Registers cache routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cache/install", post(install))
        .route("/cache/activate", post(activate))
        .route("/sync", post(sync))
        .route("/analytics/queue", post(enqueue))
        .route("/push", post(push))
        .route("/notifications/click", post(notification_click))
}

async fn install(State(state): State<AppState>) -> Result<StatusCode, HTTPError> {
    state.cache.install().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes stale stores and lists what was deleted.
async fn activate(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.cache.activate())
}

#[derive(Deserialize)]
struct SyncRequest {
    tag: String,
}

async fn sync(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Response, HTTPError> {
    let body = match state.cache.sync(&request.tag).await? {
        SyncOutcome::Ignored => json!({ "outcome": "ignored" }),
        SyncOutcome::Empty => json!({ "outcome": "empty" }),
        SyncOutcome::Flushed { events } => json!({ "outcome": "flushed", "events": events }),
    };
    Ok((StatusCode::ACCEPTED, Json(body)).into_response())
}

async fn enqueue(State(state): State<AppState>, Json(event): Json<Value>) -> StatusCode {
    state.cache.enqueue_analytics(event);
    StatusCode::ACCEPTED
}

async fn push(State(state): State<AppState>, body: Bytes) -> Json<Notification> {
    Json(state.cache.push(&body))
}

#[derive(Deserialize)]
struct ClickRequest {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    open_clients: Vec<ClientWindow>,
}

async fn notification_click(
    State(state): State<AppState>,
    Json(request): Json<ClickRequest>,
) -> Response {
    let navigation = state.cache.notification_click(
        request.action.as_deref(),
        &request.open_clients,
        &state.config.routes.dashboard,
    );
    match navigation {
        Some(navigation) => Json(navigation).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
