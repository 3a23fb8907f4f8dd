//! Push notifications and notification clicks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::PushConfig;

/// An incoming push message.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PushPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    /// Everything else is passed through as notification data.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A system notification ready to be shown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub data: Map<String, Value>,
    pub actions: Vec<NotificationAction>,
}

pub const ACTION_VIEW: &str = "view";
pub const ACTION_DISMISS: &str = "dismiss";

impl Notification {
    /// Render a raw push payload. Any JSON object is used as is, with the
    /// default title and an empty body filling in missing fields. Anything
    /// else still produces a notification, with the raw text as body.
    pub fn from_push(raw: &[u8], config: &PushConfig) -> Self {
        let (title, body, data) = match serde_json::from_slice::<PushPayload>(raw) {
            Ok(payload) => (
                payload
                    .title
                    .unwrap_or_else(|| config.default_title.clone()),
                payload.body.unwrap_or_default(),
                payload.data,
            ),
            Err(_) => (
                config.default_title.clone(),
                String::from_utf8_lossy(raw).trim().to_string(),
                Map::new(),
            ),
        };

        Notification {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            body,
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            data,
            actions: vec![
                NotificationAction {
                    action: ACTION_VIEW.to_string(),
                    title: "Ver Dashboard".to_string(),
                },
                NotificationAction {
                    action: ACTION_DISMISS.to_string(),
                    title: "Dispensar".to_string(),
                },
            ],
        }
    }
}

/// A window of the application currently open.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
}

/// What to do with the application windows after a click.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientNavigation {
    Focus { client_id: String },
    OpenWindow { url: String },
}

/// Resolve a notification click. Only the "view" action navigates.
pub fn notification_click(
    action: Option<&str>,
    open_clients: &[ClientWindow],
    dashboard: &str,
) -> Option<ClientNavigation> {
    if action != Some(ACTION_VIEW) {
        return None;
    }

    let on_dashboard = |client: &&ClientWindow| {
        let path = reqwest::Url::parse(&client.url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| client.url.clone());
        path == dashboard
    };

    Some(match open_clients.iter().find(on_dashboard) {
        Some(client) => ClientNavigation::Focus {
            client_id: client.id.clone(),
        },
        None => ClientNavigation::OpenWindow {
            url: dashboard.to_string(),
        },
    })
}
