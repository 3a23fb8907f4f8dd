//! OAuth callback reconciliation.
//!
//! After an identity provider redirects back into the application the
//! session context needs a moment to resolve the credential. The
//! reconciler waits for that with bounded, progressively slower retries
//! and then routes to the dashboard or back to sign-in.
//!
//! The decision logic is a pure [`transition`] function. Both the scheduled
//! ticks and the immediate "user observed" path feed into it, and a terminal
//! state swallows every later event, so at most one redirect is ever issued.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::config::{RetryPolicy, RoutesConfig};
use crate::models::{AuthState, Redirect};
use crate::session::{Navigator, SessionContext};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallbackPhase {
    Waiting,
    Retrying,
    Authenticated,
    TimedOut,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackState {
    pub phase: CallbackPhase,
    pub attempts: u32,
}

impl CallbackState {
    pub fn new() -> Self {
        CallbackState {
            phase: CallbackPhase::Waiting,
            attempts: 0,
        }
    }

    /// Once terminal, the reconciler has issued its single redirect.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.phase,
            CallbackPhase::Authenticated | CallbackPhase::TimedOut
        )
    }
}

impl Default for CallbackState {
    fn default() -> Self {
        Self::new()
    }
}

/// The part of [`AuthState`] the reconciler cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user_present: bool,
    pub loading: bool,
}

impl From<&AuthState> for AuthSnapshot {
    fn from(state: &AuthState) -> Self {
        AuthSnapshot {
            user_present: state.user.is_some(),
            loading: state.loading,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackEvent {
    /// A scheduled re-evaluation, `elapsed` measured from mount.
    Tick { auth: AuthSnapshot, elapsed: Duration },
    /// The session context published a new state.
    AuthChanged { auth: AuthSnapshot },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEffect {
    ScheduleTick(Duration),
    Redirect(Redirect),
}

/// Compute the next state and the effects to run.
pub fn transition(
    state: &CallbackState,
    event: &CallbackEvent,
    policy: &RetryPolicy,
    routes: &RoutesConfig,
) -> (CallbackState, Vec<CallbackEffect>) {
    if state.is_terminal() {
        return (*state, Vec::new());
    }

    let authenticated = |attempts| {
        (
            CallbackState {
                phase: CallbackPhase::Authenticated,
                attempts,
            },
            vec![CallbackEffect::Redirect(Redirect::replace(
                routes.dashboard.clone(),
            ))],
        )
    };

    match *event {
        CallbackEvent::AuthChanged { auth } => {
            if auth.user_present {
                authenticated(state.attempts)
            } else {
                (*state, Vec::new())
            }
        }
        CallbackEvent::Tick { auth, elapsed } => {
            let attempts = state.attempts;
            let retrying = |extra: Duration| {
                (
                    CallbackState {
                        phase: CallbackPhase::Retrying,
                        attempts: attempts + 1,
                    },
                    vec![CallbackEffect::ScheduleTick(
                        policy.tick_delay(attempts) + extra,
                    )],
                )
            };

            if auth.loading && attempts < policy.max_attempts && elapsed < policy.max_elapsed() {
                retrying(Duration::ZERO)
            } else if auth.user_present && !auth.loading {
                authenticated(attempts)
            } else if !auth.loading
                && attempts <= policy.settled_max_attempts
                && elapsed < policy.settled_max_elapsed()
            {
                retrying(policy.settled_extra_delay())
            } else if elapsed >= policy.max_elapsed() || attempts >= policy.max_attempts {
                (
                    CallbackState {
                        phase: CallbackPhase::TimedOut,
                        attempts,
                    },
                    vec![CallbackEffect::Redirect(Redirect::replace(
                        routes.login.clone(),
                    ))],
                )
            } else {
                // Settled without a user but still inside the overall budget.
                retrying(Duration::ZERO)
            }
        }
    }
}

/// Cosmetic urgency band shown while waiting.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaitingBanner {
    Connecting,
    Verifying,
    TakingLonger,
}

impl WaitingBanner {
    pub fn for_attempts(attempts: u32) -> Self {
        match attempts {
            0 => WaitingBanner::Connecting,
            1..=5 => WaitingBanner::Verifying,
            _ => WaitingBanner::TakingLonger,
        }
    }

    pub fn message(&self, attempts: u32, elapsed: Duration) -> String {
        let secs = elapsed.as_secs();
        match self {
            WaitingBanner::Connecting => "Finalizando autenticação...".to_string(),
            WaitingBanner::Verifying => format!(
                "Verificando sua sessão (tentativa {}, {}s)...",
                attempts, secs
            ),
            WaitingBanner::TakingLonger => format!(
                "Isso está demorando mais que o esperado ({}s). Aguarde mais um pouco...",
                secs
            ),
        }
    }
}

/// A mounted reconciler. Dropping it cancels any pending tick.
///
/// Library API for a shell that hosts the callback page and supplies a
/// [`Navigator`]; the HTTP service only evaluates guards statelessly and
/// never mounts one itself.
pub struct CallbackReconciler {
    state: watch::Receiver<CallbackState>,
    task: JoinHandle<()>,
}

impl CallbackReconciler {
    /// Start reconciling against `context`, capturing the start instant now.
    pub fn mount(
        context: &SessionContext,
        navigator: Arc<dyn Navigator>,
        policy: RetryPolicy,
        routes: RoutesConfig,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(CallbackState::new());
        let auth_rx = context.subscribe();
        let task = tokio::spawn(drive(auth_rx, state_tx, navigator, policy, routes));
        CallbackReconciler {
            state: state_rx,
            task,
        }
    }

    pub fn state(&self) -> CallbackState {
        *self.state.borrow()
    }

    /// Wait until the reconciler issued its redirect (or was torn down).
    pub async fn finished(&mut self) -> CallbackState {
        loop {
            let current = *self.state.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.state.changed().await.is_err() {
                return *self.state.borrow();
            }
        }
    }

    pub fn banner(&self, elapsed: Duration) -> (WaitingBanner, String) {
        let attempts = self.state().attempts;
        let banner = WaitingBanner::for_attempts(attempts);
        (banner, banner.message(attempts, elapsed))
    }
}

impl Drop for CallbackReconciler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive(
    mut auth_rx: watch::Receiver<AuthState>,
    state_tx: watch::Sender<CallbackState>,
    navigator: Arc<dyn Navigator>,
    policy: RetryPolicy,
    routes: RoutesConfig,
) {
    let started = Instant::now();
    let mut state = CallbackState::new();
    let mut next_tick = started + policy.tick_delay(0);

    // The user may already be there when the callback view mounts.
    let initial = CallbackEvent::AuthChanged {
        auth: AuthSnapshot::from(&*auth_rx.borrow_and_update()),
    };
    apply(&mut state, &initial, &policy, &routes, &*navigator, &mut next_tick);
    state_tx.send_replace(state);

    while !state.is_terminal() {
        let event = tokio::select! {
            _ = sleep_until(next_tick) => CallbackEvent::Tick {
                auth: AuthSnapshot::from(&*auth_rx.borrow()),
                elapsed: started.elapsed(),
            },
            changed = auth_rx.changed() => {
                if changed.is_err() {
                    warn!("Session context closed while reconciling OAuth callback");
                    return;
                }
                CallbackEvent::AuthChanged {
                    auth: AuthSnapshot::from(&*auth_rx.borrow_and_update()),
                }
            }
        };
        apply(&mut state, &event, &policy, &routes, &*navigator, &mut next_tick);
        state_tx.send_replace(state);
    }
}

fn apply(
    state: &mut CallbackState,
    event: &CallbackEvent,
    policy: &RetryPolicy,
    routes: &RoutesConfig,
    navigator: &dyn Navigator,
    next_tick: &mut Instant,
) {
    let (next, effects) = transition(state, event, policy, routes);
    if next != *state {
        debug!(
            event_name = "reconciler.transition",
            event_domain = "session",
            phase = ?next.phase,
            attempts = next.attempts,
            "oauth callback state changed"
        );
    }
    *state = next;
    for effect in effects {
        match effect {
            CallbackEffect::ScheduleTick(delay) => *next_tick = Instant::now() + delay,
            CallbackEffect::Redirect(redirect) => {
                info!(
                    event_name = "reconciler.redirect",
                    event_domain = "session",
                    to = redirect.to.as_str(),
                    attempts = state.attempts,
                    "oauth callback resolved"
                );
                navigator.replace(redirect);
            }
        }
    }
}
