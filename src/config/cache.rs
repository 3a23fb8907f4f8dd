use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Offline/network cache settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct CacheConfig {
    /// Origin every relative request is forwarded to, e.g. "http://127.0.0.1:5173".
    pub upstream: String,
    #[serde(default = "default_static_store")]
    pub static_store: String,
    #[serde(default = "default_api_store")]
    pub api_store: String,
    /// Store name of the previous generation, only compared against during activation.
    #[serde(default = "default_legacy_store")]
    pub legacy_store: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Hostname of the hosted backend; requests to it are treated as API calls.
    #[serde(default)]
    pub backend_host: Option<String>,
    /// Paths stored into the static store during install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,
    #[serde(default = "default_offline_page")]
    pub offline_page: String,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub push: PushConfig,
}

fn default_static_store() -> String {
    "affiliate-portal-static-v2".to_string()
}

fn default_api_store() -> String {
    "affiliate-portal-api-v2".to_string()
}

fn default_legacy_store() -> String {
    "affiliate-portal-v1".to_string()
}

fn default_api_prefix() -> String {
    "/api/".to_string()
}

fn default_precache() -> Vec<String> {
    ["/", "/index.html", "/offline.html", "/manifest.json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_offline_page() -> String {
    "/offline.html".to_string()
}

/// Background sync of queued analytics.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct SyncConfig {
    #[serde(default = "default_sync_tag")]
    pub tag: String,
    #[serde(default = "default_queue_key")]
    pub queue_key: String,
    /// Absolute URL, or a path resolved against `upstream`.
    #[serde(default = "default_analytics_endpoint")]
    pub analytics_endpoint: String,
}

fn default_sync_tag() -> String {
    "analytics-sync".to_string()
}

fn default_queue_key() -> String {
    "analytics_queue".to_string()
}

fn default_analytics_endpoint() -> String {
    "/api/analytics".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            tag: default_sync_tag(),
            queue_key: default_queue_key(),
            analytics_endpoint: default_analytics_endpoint(),
        }
    }
}

/// Presentation of push notifications.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct PushConfig {
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default = "default_badge")]
    pub badge: String,
    #[serde(default = "default_title")]
    pub default_title: String,
}

fn default_icon() -> String {
    "/icons/icon-192x192.png".to_string()
}

fn default_badge() -> String {
    "/icons/badge-72x72.png".to_string()
}

fn default_title() -> String {
    "Portal de Afiliados".to_string()
}

impl Default for PushConfig {
    fn default() -> Self {
        PushConfig {
            icon: default_icon(),
            badge: default_badge(),
            default_title: default_title(),
        }
    }
}

impl CacheConfig {
    /// A config with every default filled in, pointing at `upstream`.
    pub fn with_upstream(upstream: impl Into<String>) -> Self {
        CacheConfig {
            upstream: upstream.into(),
            static_store: default_static_store(),
            api_store: default_api_store(),
            legacy_store: default_legacy_store(),
            api_prefix: default_api_prefix(),
            backend_host: None,
            precache: default_precache(),
            offline_page: default_offline_page(),
            sync: SyncConfig::default(),
            push: PushConfig::default(),
        }
    }

    /// Names of the stores that survive activation.
    pub fn current_stores(&self) -> [&str; 2] {
        [self.static_store.as_str(), self.api_store.as_str()]
    }
}
