//! Shared application state.
//!
//! Contains the state that is shared across all request handlers:
//! configuration, the session context, the guards, and the offline cache.

use crate::cache::OfflineCache;
use crate::config::ConfigV1;
use crate::guards::GuardSet;
use crate::session::SessionContext;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The auth state published by the frontend shell.
    pub session: SessionContext,
    /// Route guards built from the configured routes and timers.
    pub guards: Arc<GuardSet>,
    /// Cache layer in front of the upstream origin.
    pub cache: Arc<OfflineCache>,
}
