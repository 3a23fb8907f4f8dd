//! Route guards.
//!
//! Each guard is a pure function of the injected [`AuthState`] and the
//! [`GuardContext`] of the navigation being rendered. Timers live in the
//! mount driver, which feeds elapsed readings back in through the context.

pub mod chat_guard;
pub mod mount;
pub mod profile_guard;
pub mod protected_route;

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::{AuthState, GuardDecision};

pub use chat_guard::ChatGuard;
pub use mount::ProtectedRouteMount;
pub use profile_guard::ProfileGuard;
pub use protected_route::ProtectedRoute;

/// Everything a guard needs to know about the navigation besides auth state.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, JsonSchema)]
pub struct GuardContext {
    /// The route being rendered.
    pub path: String,
    /// Navigation state explicitly asked for the profile completion flow.
    #[serde(default)]
    pub force_profile_completion: bool,
    /// The user chose to skip profile completion earlier in this session.
    #[serde(default)]
    pub skip_profile_completion: bool,
    /// How long auth has been loading since the guard mounted.
    #[serde(default)]
    pub loading_elapsed_ms: u64,
    /// How long a session has been held without a resolved user.
    #[serde(default)]
    pub session_without_user_ms: Option<u64>,
}

impl GuardContext {
    pub fn for_path(path: impl Into<String>) -> Self {
        GuardContext {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn loading_elapsed(&self) -> Duration {
        Duration::from_millis(self.loading_elapsed_ms)
    }

    pub fn session_without_user(&self) -> Option<Duration> {
        self.session_without_user_ms.map(Duration::from_millis)
    }
}

/// A guard decides whether to render, block, or redirect.
pub trait Guard: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, auth: &AuthState, context: &GuardContext) -> GuardDecision;
}

/// The guards served by the HTTP surface, built from configuration.
#[derive(Debug, Clone)]
pub struct GuardSet {
    pub protected: std::sync::Arc<ProtectedRoute>,
    pub profile: ProfileGuard,
    pub chat: ChatGuard,
}

impl GuardSet {
    pub fn new(config: &crate::config::ConfigV1) -> Self {
        GuardSet {
            protected: std::sync::Arc::new(ProtectedRoute::new(
                config.guards.clone(),
                config.routes.clone(),
            )),
            profile: ProfileGuard::new(config.routes.clone()),
            chat: ChatGuard::new(config.routes.clone()),
        }
    }

    /// Look a guard up by the name used in URLs.
    pub fn by_name(&self, name: &str) -> Option<&dyn Guard> {
        match name {
            "protected" => Some(self.protected.as_ref() as &dyn Guard),
            "profile" => Some(&self.profile as &dyn Guard),
            "chat" => Some(&self.chat as &dyn Guard),
            _ => None,
        }
    }
}
