#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use portalgate::cache::{FetchError, FetchRequest, FetchResponse, Fetcher, ResponseKind};
use portalgate::config::{extract_config, ConfigV1};
use portalgate::routes::create_router;
use portalgate::startup::build_state;
use portalgate::state::AppState;
use serde_json::Value;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:8081
logging:
  level: "debug"
  format: "json"
guards:
  loading_timeout_ms: 6000
  escape_after_ms: 4000
  user_grace_ms: 2000
cache:
  upstream: http://portal.test
  precache:
    - /
    - /offline.html
"#;

pub fn load_test_config() -> ConfigV1 {
    extract_config(Figment::new().merge(Yaml::string(TEST_CONFIG)))
        .expect("Failed to parse test config YAML")
}

/// An upstream that answers from a table and can be switched off.
#[derive(Default)]
pub struct FakeUpstream {
    routes: Mutex<HashMap<String, FetchResponse>>,
    offline: Mutex<bool>,
}

impl FakeUpstream {
    pub fn serve(&self, path: &str, body: &str) {
        self.routes.lock().unwrap().insert(
            format!("http://portal.test{}", path),
            FetchResponse {
                status: StatusCode::OK,
                headers: Default::default(),
                body: body.as_bytes().to_vec(),
                kind: ResponseKind::Basic,
            },
        );
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }
}

#[async_trait]
impl Fetcher for FakeUpstream {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        if *self.offline.lock().unwrap() {
            return Err(FetchError::Transport("connection refused".to_string()));
        }
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or(FetchResponse {
                status: StatusCode::NOT_FOUND,
                headers: Default::default(),
                body: Vec::new(),
                kind: ResponseKind::Basic,
            }))
    }
}

pub fn build_app(config: ConfigV1, fetcher: Arc<dyn Fetcher>) -> (Router, AppState) {
    let state = build_state(Arc::new(config), fetcher).expect("state should build");
    (create_router(state.clone()), state)
}

pub fn json_request(method: Method, path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn get_request(path: &str, accept: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(path)
        .header("accept", accept)
        .body(Body::empty())
        .expect("failed to build request")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable")
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be JSON")
}
