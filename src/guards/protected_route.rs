use tracing::debug;

use super::{Guard, GuardContext};
use crate::config::{GuardConfig, RoutesConfig};
use crate::models::{AuthState, GuardDecision, Redirect, RedirectReason};

/// Gates any subtree that requires a signed-in identity.
#[derive(Debug, Clone)]
pub struct ProtectedRoute {
    config: GuardConfig,
    routes: RoutesConfig,
}

impl ProtectedRoute {
    pub fn new(config: GuardConfig, routes: RoutesConfig) -> Self {
        ProtectedRoute { config, routes }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    fn to_login(&self, from: &str, reason: RedirectReason) -> GuardDecision {
        GuardDecision::Redirect(Redirect::with_reason(
            self.routes.login.clone(),
            from,
            reason,
        ))
    }

    /// The manual escape offered while loading drags on.
    ///
    /// Returns `None` until `escape_after` has passed.
    pub fn escape(&self, from: &str, loading_elapsed: std::time::Duration) -> Option<Redirect> {
        if loading_elapsed < self.config.escape_after() {
            return None;
        }
        Some(Redirect::with_reason(
            self.routes.login.clone(),
            from,
            RedirectReason::UserRequested,
        ))
    }
}

impl Guard for ProtectedRoute {
    fn name(&self) -> &str {
        "protected-route"
    }

    fn evaluate(&self, auth: &AuthState, context: &GuardContext) -> GuardDecision {
        let path = context.path.as_str();
        let loading_elapsed = context.loading_elapsed();
        let timed_out = auth.loading && loading_elapsed >= self.config.loading_timeout();

        debug!(
            guard = self.name(),
            path,
            loading = auth.loading,
            user_present = auth.user.is_some(),
            session_present = auth.session.is_some(),
            loading_elapsed_ms = context.loading_elapsed_ms,
            "evaluating guard"
        );

        if timed_out && auth.is_anonymous() {
            return self.to_login(path, RedirectReason::SessionTimeout);
        }

        if auth.loading && !timed_out {
            return GuardDecision::ShowLoading {
                escape_available: loading_elapsed >= self.config.escape_after(),
            };
        }

        if auth.is_anonymous() {
            return self.to_login(path, RedirectReason::NotAuthenticated);
        }

        if auth.session_without_user() {
            let waited = context.session_without_user().unwrap_or_default();
            if waited >= self.config.user_grace() {
                return self.to_login(path, RedirectReason::UserNotLoaded);
            }
            return GuardDecision::ShowLoading {
                escape_available: false,
            };
        }

        GuardDecision::RenderChildren
    }
}
