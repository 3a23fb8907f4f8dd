//! Caching proxy in front of the upstream origin.

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::{ACCEPT, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::Response;

use crate::cache::{FetchRequest, RequestMode};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP: [&str; 5] = [
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Infer the fetch mode the browser would have reported.
fn request_mode(method: &Method, headers: &HeaderMap) -> RequestMode {
    match headers
        .get("sec-fetch-mode")
        .and_then(|v| v.to_str().ok())
    {
        Some("navigate") => return RequestMode::Navigate,
        Some("cors") => return RequestMode::Cors,
        Some("no-cors") => return RequestMode::NoCors,
        Some("same-origin") => return RequestMode::SameOrigin,
        _ => {}
    }
    let wants_html = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);
    if *method == Method::GET && wants_html {
        RequestMode::Navigate
    } else {
        RequestMode::SameOrigin
    }
}

/// Serves any unmatched request through the offline cache.
pub async fn proxy(State(state): State<AppState>, request: Request) -> Result<Response, HTTPError> {
    let (parts, body) = request.into_parts();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = state
        .cache
        .resolve(path)
        .map_err(|e| HTTPError::bad_request(e.to_string()))?;

    let mut headers = parts.headers;
    let mode = request_mode(&parts.method, &headers);
    headers.remove(HOST);
    strip_hop_by_hop(&mut headers);

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| HTTPError::new(StatusCode::PAYLOAD_TOO_LARGE, e.to_string()))?;

    let fetch = FetchRequest {
        method: parts.method,
        url,
        headers,
        mode,
        body: body.to_vec(),
    };
    let served = state.cache.handle(&fetch).await?;

    let mut response = Response::new(Body::from(served.response.body));
    *response.status_mut() = served.response.status;
    *response.headers_mut() = served.response.headers;
    strip_hop_by_hop(response.headers_mut());
    response.headers_mut().insert(
        HeaderName::from_static("x-cache"),
        HeaderValue::from_static(served.source.as_str()),
    );
    Ok(response)
}
