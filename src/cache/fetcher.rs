use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::error::FetchError;
use super::request::{FetchRequest, FetchResponse, ResponseKind};

/// The network side of the cache layer.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

/// A fetcher backed by `reqwest`.
///
/// Responses from `origin` are marked [`ResponseKind::Basic`], anything
/// else as [`ResponseKind::Cors`].
pub struct ReqwestFetcher {
    client: reqwest::Client,
    origin: Url,
}

impl ReqwestFetcher {
    pub fn new(origin: Url) -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        ReqwestFetcher { client, origin }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn kind_for(&self, url: &Url) -> ResponseKind {
        if url.origin() == self.origin.origin() {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        }
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        debug!(
            method = %request.method,
            url = %request.url,
            "Sending upstream request"
        );
        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    FetchError::InvalidRequest(e.to_string())
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let kind = self.kind_for(response.url());
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("Error reading response body: {}", e)))?;

        Ok(FetchResponse {
            status,
            headers,
            body: body.to_vec(),
            kind,
        })
    }
}
