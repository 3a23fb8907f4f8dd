//! Timer driver for [`ProtectedRoute`].
//!
//! Tracks when loading started and when a session started waiting for its
//! user, sleeps until the next threshold, and re-evaluates the guard. The
//! first redirect wins; dropping the mount cancels every pending timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::{Guard, GuardContext, ProtectedRoute};
use crate::models::{AuthState, GuardDecision, Redirect};
use crate::session::{Navigator, SessionContext};

struct Redirector {
    navigator: Arc<dyn Navigator>,
    done: AtomicBool,
}

impl Redirector {
    /// Issue `redirect` unless one was already issued for this mount.
    fn issue(&self, redirect: Redirect) -> bool {
        if self
            .done
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.navigator.replace(redirect);
        true
    }
}

/// A [`ProtectedRoute`] mounted on a path.
///
/// Library API for an embedding shell that owns navigation. The HTTP
/// service evaluates the guard per request through `POST /guards/protected`
/// with caller-supplied timer readings and does not mount it.
pub struct ProtectedRouteMount {
    guard: Arc<ProtectedRoute>,
    path: String,
    decision: watch::Receiver<GuardDecision>,
    loading_since: watch::Receiver<Option<Instant>>,
    redirector: Arc<Redirector>,
    task: JoinHandle<()>,
}

impl ProtectedRouteMount {
    pub fn mount(
        guard: Arc<ProtectedRoute>,
        context: &SessionContext,
        navigator: Arc<dyn Navigator>,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let redirector = Arc::new(Redirector {
            navigator,
            done: AtomicBool::new(false),
        });
        let (decision_tx, decision_rx) = watch::channel(GuardDecision::ShowLoading {
            escape_available: false,
        });
        let (loading_tx, loading_rx) = watch::channel(None);

        let task = tokio::spawn(drive(
            guard.clone(),
            context.subscribe(),
            path.clone(),
            redirector.clone(),
            decision_tx,
            loading_tx,
        ));

        ProtectedRouteMount {
            guard,
            path,
            decision: decision_rx,
            loading_since: loading_rx,
            redirector,
            task,
        }
    }

    /// The most recent decision.
    pub fn decision(&self) -> GuardDecision {
        self.decision.borrow().clone()
    }

    /// Wait for the next decision change.
    pub async fn changed(&mut self) -> Option<GuardDecision> {
        self.decision.changed().await.ok()?;
        Some(self.decision.borrow_and_update().clone())
    }

    /// The user asked to leave the loading screen.
    ///
    /// Only honoured once the escape delay has passed and no redirect was
    /// issued yet. Returns the redirect when it was issued.
    pub fn escape(&self) -> Option<Redirect> {
        let since = (*self.loading_since.borrow())?;
        let redirect = self.guard.escape(&self.path, since.elapsed())?;
        if self.redirector.issue(redirect.clone()) {
            self.task.abort();
            Some(redirect)
        } else {
            None
        }
    }
}

impl Drop for ProtectedRouteMount {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

async fn drive(
    guard: Arc<ProtectedRoute>,
    mut auth_rx: watch::Receiver<AuthState>,
    path: String,
    redirector: Arc<Redirector>,
    decision_tx: watch::Sender<GuardDecision>,
    loading_tx: watch::Sender<Option<Instant>>,
) {
    let config = guard.config().clone();
    let mut loading_since: Option<Instant> = None;
    let mut waiting_user_since: Option<Instant> = None;

    loop {
        let auth = auth_rx.borrow_and_update().clone();
        let now = Instant::now();

        loading_since = if auth.loading {
            Some(loading_since.unwrap_or(now))
        } else {
            None
        };
        waiting_user_since = if auth.session_without_user() {
            Some(waiting_user_since.unwrap_or(now))
        } else {
            None
        };
        loading_tx.send_replace(loading_since);

        let context = GuardContext {
            path: path.clone(),
            loading_elapsed_ms: loading_since.map(|t| millis(now - t)).unwrap_or(0),
            session_without_user_ms: waiting_user_since.map(|t| millis(now - t)),
            ..Default::default()
        };
        let decision = guard.evaluate(&auth, &context);
        decision_tx.send_replace(decision.clone());

        if let GuardDecision::Redirect(redirect) = decision {
            if !redirector.issue(redirect) {
                debug!(path = path.as_str(), "redirect already issued for this mount");
            }
            return;
        }

        // Next threshold that could change the decision.
        let mut deadlines = Vec::new();
        if let Some(start) = loading_since {
            deadlines.push(start + config.escape_after());
            deadlines.push(start + config.loading_timeout());
        }
        if let Some(start) = waiting_user_since {
            deadlines.push(start + config.user_grace());
        }
        let next = deadlines.into_iter().filter(|d| *d > now).min();

        match next {
            Some(deadline) => {
                tokio::select! {
                    _ = sleep_until(deadline) => {}
                    changed = auth_rx.changed() => {
                        if changed.is_err() {
                            warn!("Session context closed, stopping guard");
                            return;
                        }
                    }
                }
            }
            None => {
                if auth_rx.changed().await.is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GuardConfig, RoutesConfig};
    use crate::models::{Identity, RedirectReason, Session};
    use crate::session::ChannelNavigator;

    fn guard() -> Arc<ProtectedRoute> {
        Arc::new(ProtectedRoute::new(
            GuardConfig::default(),
            RoutesConfig::default(),
        ))
    }

    fn session() -> Session {
        Session {
            access_token: "token".to_string(),
            expires_at: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_times_out_with_session_timeout() {
        let context = SessionContext::default();
        let (navigator, mut rx) = ChannelNavigator::channel();
        let mount = ProtectedRouteMount::mount(guard(), &context, Arc::new(navigator), "/dashboard");

        tokio::time::sleep(Duration::from_millis(5900)).await;
        assert!(mount.decision().is_loading());
        assert!(rx.try_recv().is_err());

        let redirect = rx.recv().await.unwrap();
        assert_eq!(redirect.reason(), Some(RedirectReason::SessionTimeout));
        assert_eq!(redirect.state.unwrap().from, "/dashboard");
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_becomes_available_before_timeout() {
        let context = SessionContext::default();
        let (navigator, mut rx) = ChannelNavigator::channel();
        let mount = ProtectedRouteMount::mount(guard(), &context, Arc::new(navigator), "/dashboard");

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert!(mount.escape().is_none());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(
            mount.decision(),
            GuardDecision::ShowLoading {
                escape_available: true
            }
        );
        let redirect = mount.escape().expect("escape should be available");
        assert_eq!(redirect.reason(), Some(RedirectReason::UserRequested));
        assert_eq!(rx.recv().await.unwrap(), redirect);

        // The hard timeout must not fire a second redirect.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_without_user_redirects_after_grace() {
        let context = SessionContext::default();
        let (navigator, mut rx) = ChannelNavigator::channel();
        let _mount = ProtectedRouteMount::mount(guard(), &context, Arc::new(navigator), "/dashboard");

        tokio::task::yield_now().await;
        context.session_established(session());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(rx.try_recv().is_err());

        let redirect = rx.recv().await.unwrap();
        assert_eq!(redirect.reason(), Some(RedirectReason::UserNotLoaded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_in_renders_children_and_cancels_timers() {
        let context = SessionContext::default();
        let (navigator, mut rx) = ChannelNavigator::channel();
        let mut mount =
            ProtectedRouteMount::mount(guard(), &context, Arc::new(navigator), "/dashboard");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        context.sign_in(
            Identity {
                id: "u-1".to_string(),
                email: "ana@example.com".to_string(),
                provider: None,
                metadata: Default::default(),
            },
            session(),
            None,
        );

        loop {
            match mount.changed().await {
                Some(GuardDecision::RenderChildren) => break,
                Some(_) => continue,
                None => panic!("guard stopped"),
            }
        }
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_cancels_timeout() {
        let context = SessionContext::default();
        let (navigator, mut rx) = ChannelNavigator::channel();
        let mount = ProtectedRouteMount::mount(guard(), &context, Arc::new(navigator), "/dashboard");

        tokio::time::sleep(Duration::from_millis(1000)).await;
        drop(mount);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }
}
