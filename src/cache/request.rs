use http::{HeaderMap, Method, StatusCode};
use reqwest::Url;

use crate::config::CacheConfig;

/// How the request was issued by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// A full page load.
    Navigate,
    SameOrigin,
    Cors,
    NoCors,
}

/// Where a response came from, in the fetch sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Same-origin response.
    Basic,
    Cors,
    Opaque,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub mode: RequestMode,
    pub body: Vec<u8>,
}

impl FetchRequest {
    pub fn get(url: Url, mode: RequestMode) -> Self {
        FetchRequest {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            mode,
            body: Vec::new(),
        }
    }

    pub fn key(&self) -> CacheKey {
        CacheKey {
            method: self.method.clone(),
            url: self.url.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub kind: ResponseKind,
}

impl FetchResponse {
    pub fn is_ok_200(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Entries are keyed by request method and absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: Method,
    pub url: String,
}

impl CacheKey {
    pub fn get(url: &Url) -> Self {
        CacheKey {
            method: Method::GET,
            url: url.to_string(),
        }
    }
}

/// Which caching policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    Api,
    Navigation,
    Asset,
}

impl RequestClass {
    pub fn classify(request: &FetchRequest, config: &CacheConfig) -> Self {
        let backend_hit = match (&config.backend_host, request.url.host_str()) {
            (Some(backend), Some(host)) => backend.eq_ignore_ascii_case(host),
            _ => false,
        };
        if backend_hit || request.url.path().starts_with(config.api_prefix.as_str()) {
            return RequestClass::Api;
        }
        if request.mode == RequestMode::Navigate {
            return RequestClass::Navigation;
        }
        RequestClass::Asset
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Api => "api",
            RequestClass::Navigation => "navigation",
            RequestClass::Asset => "asset",
        }
    }
}
