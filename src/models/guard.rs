use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Machine-readable reason attached to a redirect.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    SessionTimeout,
    NotAuthenticated,
    UserNotLoaded,
    UserRequested,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::SessionTimeout => "session_timeout",
            RedirectReason::NotAuthenticated => "not_authenticated",
            RedirectReason::UserNotLoaded => "user_not_loaded",
            RedirectReason::UserRequested => "user_requested",
        }
    }
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State bag carried along with a redirect.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct NavigationState {
    pub from: String,
    pub reason: RedirectReason,
}

/// A navigation request. Guards always replace the current history entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct Redirect {
    pub to: String,
    pub replace: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<NavigationState>,
}

impl Redirect {
    pub fn replace(to: impl Into<String>) -> Self {
        Redirect {
            to: to.into(),
            replace: true,
            state: None,
        }
    }

    pub fn with_reason(to: impl Into<String>, from: impl Into<String>, reason: RedirectReason) -> Self {
        Redirect {
            to: to.into(),
            replace: true,
            state: Some(NavigationState {
                from: from.into(),
                reason,
            }),
        }
    }

    pub fn reason(&self) -> Option<RedirectReason> {
        self.state.as_ref().map(|s| s.reason)
    }
}

/// A navigation affordance offered by a blocked view.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct BlockedAction {
    pub label: String,
    pub to: String,
}

/// Inline explanation rendered instead of the guarded content.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct BlockedView {
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_label: Option<String>,
    pub actions: Vec<BlockedAction>,
}

/// What a guard decided for the current render.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    ShowLoading { escape_available: bool },
    Redirect(Redirect),
    RenderChildren,
    RenderBlocked(BlockedView),
}

impl GuardDecision {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            GuardDecision::Redirect(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, GuardDecision::ShowLoading { .. })
    }
}
