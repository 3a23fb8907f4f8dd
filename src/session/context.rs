//! The session context shared by guards and the OAuth callback reconciler.
//!
//! The context is injected explicitly: whoever owns credential events
//! publishes new [`AuthState`] values, everyone else subscribes and reads.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::models::{AuthState, Identity, Profile, Session};

/// Publishes [`AuthState`] changes to any number of subscribers.
#[derive(Clone)]
pub struct SessionContext {
    sender: Arc<watch::Sender<AuthState>>,
}

impl SessionContext {
    pub fn new(initial: AuthState) -> Self {
        let (sender, _) = watch::channel(initial);
        SessionContext {
            sender: Arc::new(sender),
        }
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> AuthState {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.sender.subscribe()
    }

    /// Publish a brand new state.
    pub fn replace(&self, state: AuthState) {
        debug!(
            event_name = "session.state.replaced",
            event_domain = "session",
            user_present = state.user.is_some(),
            session_present = state.session.is_some(),
            loading = state.loading,
            "auth state replaced"
        );
        self.sender.send_replace(state);
    }

    /// Apply an in-place change and notify subscribers.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut AuthState),
    {
        self.sender.send_modify(f);
    }

    /// A credential resolution started.
    pub fn begin_loading(&self) {
        self.update(|state| state.loading = true);
    }

    /// A credential is held, the identity is still being resolved.
    pub fn session_established(&self, session: Session) {
        self.update(|state| {
            state.session = Some(session);
            state.loading = false;
        });
    }

    /// The identity and its profile resolved.
    pub fn sign_in(&self, identity: Identity, session: Session, profile: Option<Profile>) {
        self.replace(AuthState {
            user: Some(identity),
            session: Some(session),
            profile,
            loading: false,
        });
    }

    pub fn sign_out(&self) {
        self.replace(AuthState::default());
    }

    /// Settle a resolution attempt that produced nothing.
    pub fn settle(&self) {
        self.update(|state| state.loading = false);
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        SessionContext::new(AuthState::loading())
    }
}
