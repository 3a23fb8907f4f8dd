mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{
    body_bytes, body_json, build_app, get_request, json_request, load_test_config, FakeUpstream,
};
use mockito::{Matcher, Server};
use portalgate::cache::ReqwestFetcher;
use reqwest::Url;
use serde_json::json;
use tower::ServiceExt;

fn x_cache(response: &axum::response::Response) -> String {
    response
        .headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn integration_api_served_stale_when_upstream_down() {
    let upstream = Arc::new(FakeUpstream::default());
    upstream.serve("/api/commissions?page=1", r#"{"items":[1,2]}"#);
    let (app, _) = build_app(load_test_config(), upstream.clone());

    let first = app
        .clone()
        .oneshot(get_request("/api/commissions?page=1", "application/json"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(x_cache(&first), "miss");

    upstream.set_offline(true);
    let second = app
        .clone()
        .oneshot(get_request("/api/commissions?page=1", "application/json"))
        .await
        .unwrap();
    assert_eq!(x_cache(&second), "offline-fallback");
    assert_eq!(body_bytes(second).await, br#"{"items":[1,2]}"#);

    let uncached = app
        .oneshot(get_request("/api/payments", "application/json"))
        .await
        .unwrap();
    assert_eq!(uncached.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn integration_navigation_offline_fallback() {
    let upstream = Arc::new(FakeUpstream::default());
    upstream.serve("/", "<html>shell</html>");
    upstream.serve("/offline.html", "<html>sem conexão</html>");
    let (app, state) = build_app(load_test_config(), upstream.clone());

    let install = app
        .clone()
        .oneshot(json_request(Method::POST, "/cache/install", json!({})))
        .await
        .unwrap();
    assert_eq!(install.status(), StatusCode::NO_CONTENT);
    assert_eq!(state.cache.storage().open(&state.config.cache.static_store).len(), 2);

    upstream.set_offline(true);
    let response = app
        .oneshot(get_request("/dashboard/content", "text/html"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(x_cache(&response), "offline-fallback");
    assert_eq!(
        String::from_utf8(body_bytes(response).await).unwrap(),
        "<html>sem conexão</html>"
    );
}

#[tokio::test]
async fn integration_activate_removes_legacy_store() {
    let (app, state) = build_app(load_test_config(), Arc::new(FakeUpstream::default()));
    let legacy = state.config.cache.legacy_store.clone();
    state.cache.storage().open(&legacy);
    state.cache.storage().open(&state.config.cache.static_store);

    let response = app
        .oneshot(json_request(Method::POST, "/cache/activate", json!({})))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([legacy.clone()]));
    assert!(!state.cache.storage().keys().contains(&legacy));
}

#[tokio::test]
async fn integration_assets_through_real_upstream() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/assets/index.css")
        .with_status(200)
        .with_header("content-type", "text/css")
        .with_body("body{margin:0}")
        .expect(1)
        .create_async()
        .await;

    let mut config = load_test_config();
    config.cache.upstream = server.url();
    let fetcher = Arc::new(ReqwestFetcher::new(Url::parse(&server.url()).unwrap()));
    let (app, _) = build_app(config, fetcher);

    let first = app
        .clone()
        .oneshot(get_request("/assets/index.css", "text/css"))
        .await
        .unwrap();
    assert_eq!(x_cache(&first), "miss");
    assert_eq!(first.headers().get("content-type").unwrap(), "text/css");

    let second = app
        .oneshot(get_request("/assets/index.css", "text/css"))
        .await
        .unwrap();
    assert_eq!(x_cache(&second), "hit");
    assert_eq!(body_bytes(second).await, b"body{margin:0}");

    m.assert_async().await;
}

#[tokio::test]
async fn integration_background_sync_posts_queue() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/api/analytics")
        .match_header("content-type", "application/json")
        .match_body(Matcher::JsonString(
            r#"[{"event":"link_click","link":"abc"}]"#.to_string(),
        ))
        .with_status(200)
        .create_async()
        .await;

    let mut config = load_test_config();
    config.cache.upstream = server.url();
    let fetcher = Arc::new(ReqwestFetcher::new(Url::parse(&server.url()).unwrap()));
    let (app, state) = build_app(config, fetcher);

    let queued = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/analytics/queue",
            json!({"event": "link_click", "link": "abc"}),
        ))
        .await
        .unwrap();
    assert_eq!(queued.status(), StatusCode::ACCEPTED);

    let response = app
        .oneshot(json_request(Method::POST, "/sync", json!({"tag": "analytics-sync"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await, json!({"outcome": "flushed", "events": 1}));
    assert_eq!(state.cache.queue().len("analytics_queue"), 0);
    m.assert_async().await;
}

#[tokio::test]
async fn integration_background_sync_failure_is_reported() {
    let upstream = Arc::new(FakeUpstream::default());
    upstream.set_offline(true);
    let (app, state) = build_app(load_test_config(), upstream);
    state.cache.enqueue_analytics(json!({"event": "view"}));

    let response = app
        .oneshot(json_request(Method::POST, "/sync", json!({"tag": "analytics-sync"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(state.cache.queue().len("analytics_queue"), 1);
}

#[tokio::test]
async fn integration_push_and_click() {
    let (app, _) = build_app(load_test_config(), Arc::new(FakeUpstream::default()));

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/push",
            json!({"title": "Pagamento aprovado", "body": "R$ 120,00", "payment_id": "p-9"}),
        ))
        .await
        .unwrap();
    let notification = body_json(response).await;
    assert_eq!(notification["title"], "Pagamento aprovado");
    assert_eq!(notification["data"]["payment_id"], "p-9");
    assert_eq!(notification["actions"][0]["action"], "view");
    assert_eq!(notification["actions"][1]["action"], "dismiss");

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/notifications/click",
            json!({"action": "view", "open_clients": []}),
        ))
        .await
        .unwrap();
    assert_eq!(
        body_json(response).await,
        json!({"type": "open_window", "url": "/dashboard"})
    );

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/notifications/click",
            json!({"action": "dismiss"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn integration_health() {
    let (app, _) = build_app(load_test_config(), Arc::new(FakeUpstream::default()));
    let response = app
        .oneshot(get_request("/health", "text/plain"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}
