//! Session state and OAuth callback reconciliation.

pub mod context;
pub mod navigator;
pub mod reconciler;

pub use context::SessionContext;
pub use navigator::{ChannelNavigator, Navigator};
pub use reconciler::{
    transition, AuthSnapshot, CallbackEffect, CallbackEvent, CallbackPhase, CallbackReconciler,
    CallbackState, WaitingBanner,
};
