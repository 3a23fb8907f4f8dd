//! The offline cache: install, activate, and per-request policies.
//!
//! - API requests are network-first, falling back to the API store.
//! - Navigations are cache-first, falling back to the offline page.
//! - Everything else is cache-first and opportunistically populates the
//!   static store with same-origin successes.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::error::{CacheError, FetchError};
use super::fetcher::Fetcher;
use super::push::{notification_click, ClientNavigation, ClientWindow, Notification};
use super::request::{
    CacheKey, FetchRequest, FetchResponse, RequestClass, RequestMode, ResponseKind,
};
use super::storage::{CacheStorage, CacheStore};
use super::sync::{AnalyticsQueue, SyncOutcome};
use crate::config::CacheConfig;
use crate::utils::log_throttle::should_emit;

const CACHE_HIT_LOG_WINDOW: Duration = Duration::from_secs(30);

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Served from a store without touching the network.
    Hit,
    /// Fetched from the network.
    Miss,
    /// Network failed, a previously stored API response was served.
    Stale,
    /// Network failed, the offline page was served.
    OfflineFallback,
    /// Not cacheable, passed straight through.
    Bypass,
}

impl CacheSource {
    /// The `X-Cache` value. Both kinds of network-failure fallback report
    /// `offline-fallback`.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheSource::Hit => "hit",
            CacheSource::Miss => "miss",
            CacheSource::Stale | CacheSource::OfflineFallback => "offline-fallback",
            CacheSource::Bypass => "bypass",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Served {
    pub response: FetchResponse,
    pub source: CacheSource,
}

impl Served {
    fn new(response: FetchResponse, source: CacheSource) -> Self {
        Served { response, source }
    }
}

/// The cache layer sitting between pages and the network.
pub struct OfflineCache {
    config: CacheConfig,
    origin: Url,
    storage: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    queue: AnalyticsQueue,
}

impl OfflineCache {
    pub fn new(config: CacheConfig, origin: Url, fetcher: Arc<dyn Fetcher>) -> Self {
        OfflineCache {
            config,
            origin,
            storage: CacheStorage::new(),
            fetcher,
            queue: AnalyticsQueue::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn queue(&self) -> &AnalyticsQueue {
        &self.queue
    }

    fn static_store(&self) -> Arc<CacheStore> {
        self.storage.open(&self.config.static_store)
    }

    fn api_store(&self) -> Arc<CacheStore> {
        self.storage.open(&self.config.api_store)
    }

    /// Resolve a path (or absolute URL) against the origin.
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.origin
            .join(path)
            .map_err(|e| FetchError::InvalidRequest(format!("{}: {}", path, e)))
    }

    /// Fill the static store with the precache manifest.
    ///
    /// All or nothing: when one entry fails nothing is stored.
    pub async fn install(&self) -> Result<usize, CacheError> {
        info!(
            event_name = "cache.install.started",
            event_domain = "cache",
            entries = self.config.precache.len(),
            store = self.config.static_store.as_str(),
            "Precaching static assets"
        );

        let fetches = self.config.precache.iter().map(|path| async move {
            let precache_err = |reason: String| CacheError::Precache {
                path: path.clone(),
                reason,
            };
            let url = self.resolve(path).map_err(|e| precache_err(e.to_string()))?;
            let request = FetchRequest::get(url, RequestMode::SameOrigin);
            let response = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|e| precache_err(e.to_string()))?;
            if !response.status.is_success() {
                return Err(precache_err(format!("status {}", response.status)));
            }
            Ok::<_, CacheError>((request.key(), response))
        });

        let mut entries = Vec::with_capacity(self.config.precache.len());
        for result in join_all(fetches).await {
            match result {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    error!(
                        event_name = "cache.install.failed",
                        event_domain = "cache",
                        error = %e,
                        "Install aborted"
                    );
                    return Err(e);
                }
            }
        }

        let store = self.static_store();
        let count = entries.len();
        for (key, response) in entries {
            store.put(key, response);
        }
        info!(
            event_name = "cache.install.completed",
            event_domain = "cache",
            entries = count,
            "Precache complete"
        );
        Ok(count)
    }

    /// Delete every store that is not one of the two current stores.
    pub fn activate(&self) -> Vec<String> {
        let current = self.config.current_stores();
        let mut deleted = Vec::new();
        for name in self.storage.keys() {
            if current.contains(&name.as_str()) {
                continue;
            }
            if self.storage.delete(&name) {
                info!(
                    event_name = "cache.store.deleted",
                    event_domain = "cache",
                    store = name.as_str(),
                    legacy = name == self.config.legacy_store,
                    "Deleting stale cache store"
                );
                deleted.push(name);
            }
        }
        deleted
    }

    /// Serve a request according to its class.
    pub async fn handle(&self, request: &FetchRequest) -> Result<Served, CacheError> {
        if request.method != Method::GET {
            let response = self.fetcher.fetch(request).await?;
            return Ok(Served::new(response, CacheSource::Bypass));
        }

        let class = RequestClass::classify(request, &self.config);
        debug!(
            method = %request.method,
            url = %request.url,
            class = class.as_str(),
            "Handling request"
        );
        match class {
            RequestClass::Api => self.network_first(request).await,
            RequestClass::Navigation => self.navigation(request).await,
            RequestClass::Asset => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &FetchRequest) -> Result<Served, CacheError> {
        let store = self.api_store();
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok_200() {
                    store.put(request.key(), response.clone());
                }
                Ok(Served::new(response, CacheSource::Miss))
            }
            Err(e) => match store.match_request(request) {
                Some(cached) => {
                    warn!(
                        event_name = "cache.api.stale",
                        event_domain = "cache",
                        url = %request.url,
                        error = %e,
                        "Network failed, serving cached API response"
                    );
                    Ok(Served::new(cached, CacheSource::Stale))
                }
                None => Err(CacheError::Network(e)),
            },
        }
    }

    async fn navigation(&self, request: &FetchRequest) -> Result<Served, CacheError> {
        let store = self.static_store();
        if let Some(cached) = store.match_request(request) {
            self.log_hit(request);
            return Ok(Served::new(cached, CacheSource::Hit));
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok_200() {
                    store.put(request.key(), response.clone());
                }
                Ok(Served::new(response, CacheSource::Miss))
            }
            Err(e) => {
                warn!(
                    event_name = "cache.navigation.offline",
                    event_domain = "cache",
                    url = %request.url,
                    error = %e,
                    "Navigation failed, serving offline page"
                );
                let offline = self
                    .resolve(&self.config.offline_page)
                    .ok()
                    .and_then(|url| store.match_key(&CacheKey::get(&url)));
                match offline {
                    Some(page) => Ok(Served::new(page, CacheSource::OfflineFallback)),
                    None => Err(CacheError::Offline),
                }
            }
        }
    }

    async fn cache_first(&self, request: &FetchRequest) -> Result<Served, CacheError> {
        let store = self.static_store();
        if let Some(cached) = store.match_request(request) {
            self.log_hit(request);
            return Ok(Served::new(cached, CacheSource::Hit));
        }

        let response = self.fetcher.fetch(request).await?;
        if response.is_ok_200() && response.kind == ResponseKind::Basic {
            store.put(request.key(), response.clone());
        }
        Ok(Served::new(response, CacheSource::Miss))
    }

    fn log_hit(&self, request: &FetchRequest) {
        if let Some(suppressed_count) = should_emit("cache.static.hit", CACHE_HIT_LOG_WINDOW) {
            debug!(
                event_name = "cache.static.hit",
                event_domain = "cache",
                url = %request.url,
                cache_result = "hit",
                suppressed_count,
                "response served from cache"
            );
        }
    }

    /// Queue an analytics event for the next background sync.
    pub fn enqueue_analytics(&self, event: Value) {
        self.queue.push(&self.config.sync.queue_key, event);
    }

    /// Handle a background sync event.
    ///
    /// The queued events are taken out before the POST, so overlapping
    /// syncs never send the same event twice. On failure they are put
    /// back and the error returned; retry scheduling belongs to whoever
    /// fires sync events.
    pub async fn sync(&self, tag: &str) -> Result<SyncOutcome, CacheError> {
        if tag != self.config.sync.tag {
            debug!(tag, "Ignoring unknown sync tag");
            return Ok(SyncOutcome::Ignored);
        }

        let key = self.config.sync.queue_key.as_str();
        let events = match self.queue.take(key) {
            Some(events) => events,
            None => return Ok(SyncOutcome::Empty),
        };
        let count = events.len();

        let prepared = self
            .resolve(&self.config.sync.analytics_endpoint)
            .map_err(|e| e.to_string())
            .and_then(|url| {
                serde_json::to_vec(&events)
                    .map(|body| (url, body))
                    .map_err(|e| e.to_string())
            });
        let (url, body) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                self.queue.restore(key, events);
                return Err(CacheError::Sync(e));
            }
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let request = FetchRequest {
            method: Method::POST,
            url,
            headers,
            mode: RequestMode::SameOrigin,
            body,
        };

        let failure = match self.fetcher.fetch(&request).await {
            Ok(response) if response.status.is_success() => {
                info!(
                    event_name = "cache.sync.flushed",
                    event_domain = "cache",
                    events = count,
                    "Analytics flushed"
                );
                return Ok(SyncOutcome::Flushed { events: count });
            }
            Ok(response) => format!("analytics endpoint answered {}", response.status),
            Err(e) => e.to_string(),
        };

        self.queue.restore(key, events);
        warn!(
            event_name = "cache.sync.failed",
            event_domain = "cache",
            events = count,
            error = failure.as_str(),
            "Analytics sync failed"
        );
        Err(CacheError::Sync(failure))
    }

    /// Render an incoming push message.
    pub fn push(&self, raw: &[u8]) -> Notification {
        Notification::from_push(raw, &self.config.push)
    }

    /// Resolve a click on a notification.
    pub fn notification_click(
        &self,
        action: Option<&str>,
        open_clients: &[ClientWindow],
        dashboard: &str,
    ) -> Option<ClientNavigation> {
        notification_click(action, open_clients, dashboard)
    }
}
