use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Well-known application routes the guards redirect to.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct RoutesConfig {
    #[serde(default = "default_login")]
    pub login: String,
    #[serde(default = "default_dashboard")]
    pub dashboard: String,
    #[serde(default = "default_complete_profile")]
    pub complete_profile: String,
    /// Routes that require a complete profile.
    #[serde(default = "default_premium")]
    pub premium: Vec<String>,
}

fn default_login() -> String {
    "/login".to_string()
}

fn default_dashboard() -> String {
    "/dashboard".to_string()
}

fn default_complete_profile() -> String {
    "/complete-profile".to_string()
}

fn default_premium() -> Vec<String> {
    [
        "/dashboard/reports",
        "/dashboard/commissions",
        "/dashboard/payments",
        "/dashboard/content",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for RoutesConfig {
    fn default() -> Self {
        RoutesConfig {
            login: default_login(),
            dashboard: default_dashboard(),
            complete_profile: default_complete_profile(),
            premium: default_premium(),
        }
    }
}

/// Timers of the identity guard, in milliseconds.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct GuardConfig {
    #[serde(default = "default_loading_timeout")]
    pub loading_timeout_ms: u64,
    #[serde(default = "default_escape_after")]
    pub escape_after_ms: u64,
    #[serde(default = "default_user_grace")]
    pub user_grace_ms: u64,
}

fn default_loading_timeout() -> u64 {
    6000
}

fn default_escape_after() -> u64 {
    4000
}

fn default_user_grace() -> u64 {
    2000
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            loading_timeout_ms: default_loading_timeout(),
            escape_after_ms: default_escape_after(),
            user_grace_ms: default_user_grace(),
        }
    }
}

impl GuardConfig {
    pub fn loading_timeout(&self) -> Duration {
        Duration::from_millis(self.loading_timeout_ms)
    }

    pub fn escape_after(&self) -> Duration {
        Duration::from_millis(self.escape_after_ms)
    }

    pub fn user_grace(&self) -> Duration {
        Duration::from_millis(self.user_grace_ms)
    }
}

/// Bounds of the OAuth callback retry loop.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, JsonSchema)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_ms: u64,
    /// Attempts allowed once loading has settled without a user.
    #[serde(default = "default_settled_max_attempts")]
    pub settled_max_attempts: u32,
    #[serde(default = "default_settled_max_elapsed")]
    pub settled_max_elapsed_ms: u64,
    #[serde(default = "default_settled_extra_delay")]
    pub settled_extra_delay_ms: u64,
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_delay_step")]
    pub delay_step_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_max_elapsed() -> u64 {
    20_000
}

fn default_settled_max_attempts() -> u32 {
    5
}

fn default_settled_max_elapsed() -> u64 {
    15_000
}

fn default_settled_extra_delay() -> u64 {
    2000
}

fn default_base_delay() -> u64 {
    1500
}

fn default_delay_step() -> u64 {
    300
}

fn default_max_delay() -> u64 {
    2500
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: default_max_attempts(),
            max_elapsed_ms: default_max_elapsed(),
            settled_max_attempts: default_settled_max_attempts(),
            settled_max_elapsed_ms: default_settled_max_elapsed(),
            settled_extra_delay_ms: default_settled_extra_delay(),
            base_delay_ms: default_base_delay(),
            delay_step_ms: default_delay_step(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Progressive delay before the next tick: `min(base + attempts * step, max)`.
    pub fn tick_delay(&self, attempts: u32) -> Duration {
        let ms = self
            .base_delay_ms
            .saturating_add(u64::from(attempts).saturating_mul(self.delay_step_ms))
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    pub fn settled_max_elapsed(&self) -> Duration {
        Duration::from_millis(self.settled_max_elapsed_ms)
    }

    pub fn settled_extra_delay(&self) -> Duration {
        Duration::from_millis(self.settled_extra_delay_ms)
    }
}
