//! Offline/network cache layer.

pub mod error;
pub mod fetcher;
pub mod push;
pub mod request;
pub mod storage;
pub mod sync;
pub mod worker;

pub use error::{CacheError, FetchError};
pub use fetcher::{Fetcher, ReqwestFetcher};
pub use push::{ClientNavigation, ClientWindow, Notification};
pub use request::{
    CacheKey, FetchRequest, FetchResponse, RequestClass, RequestMode, ResponseKind,
};
pub use storage::{CacheStorage, CacheStore};
pub use sync::{AnalyticsQueue, SyncOutcome};
pub use worker::{CacheSource, OfflineCache, Served};
