use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::Redirect;

/// The routing collaborator. Guards only ever replace the current history entry.
pub trait Navigator: Send + Sync {
    fn replace(&self, redirect: Redirect);
}

/// A navigator that forwards redirects to whoever owns the receiving end.
#[derive(Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<Redirect>,
}

impl ChannelNavigator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Redirect>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelNavigator { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn replace(&self, redirect: Redirect) {
        info!(
            event_name = "navigation.replace",
            event_domain = "navigation",
            to = redirect.to.as_str(),
            reason = redirect.reason().map(|r| r.as_str()).unwrap_or("none"),
            "navigating"
        );
        if self.tx.send(redirect).is_err() {
            warn!("Navigation receiver dropped, redirect discarded");
        }
    }
}
