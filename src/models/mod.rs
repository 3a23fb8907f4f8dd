pub mod auth_state;
pub mod guard;

pub use auth_state::{AffiliateStatus, AuthState, Identity, Profile, Session};
pub use guard::{
    BlockedAction, BlockedView, GuardDecision, NavigationState, Redirect, RedirectReason,
};
