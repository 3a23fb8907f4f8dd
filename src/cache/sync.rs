//! Locally queued analytics, flushed by background sync.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

/// Key/value blobs waiting to be sent to the server.
#[derive(Debug, Default)]
pub struct AnalyticsQueue {
    blobs: Mutex<HashMap<String, Vec<Value>>>,
}

impl AnalyticsQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the blob stored under `key`.
    pub fn push(&self, key: &str, event: Value) {
        self.blobs
            .lock()
            .expect("analytics queue mutex poisoned")
            .entry(key.to_string())
            .or_default()
            .push(event);
    }

    /// The blob under `key`, serialized exactly as it will be sent.
    ///
    /// The blob is the JSON array of queued events in arrival order, so a
    /// single queued `{"e":1}` is sent as `[{"e":1}]`.
    pub fn peek(&self, key: &str) -> Option<String> {
        let blobs = self.blobs.lock().expect("analytics queue mutex poisoned");
        let events = blobs.get(key).filter(|events| !events.is_empty())?;
        serde_json::to_string(events).ok()
    }

    /// Move every event under `key` out of the queue.
    ///
    /// Taken events are invisible to a concurrent `take`, so each event is
    /// in flight at most once. Hand them back with `restore` if delivery
    /// fails.
    pub fn take(&self, key: &str) -> Option<Vec<Value>> {
        let mut blobs = self.blobs.lock().expect("analytics queue mutex poisoned");
        blobs.remove(key).filter(|events| !events.is_empty())
    }

    /// Put undelivered events back ahead of anything queued since `take`.
    pub fn restore(&self, key: &str, mut events: Vec<Value>) {
        if events.is_empty() {
            return;
        }
        let mut blobs = self.blobs.lock().expect("analytics queue mutex poisoned");
        let queued = blobs.entry(key.to_string()).or_default();
        events.append(queued);
        *queued = events;
    }

    pub fn len(&self, key: &str) -> usize {
        self.blobs
            .lock()
            .expect("analytics queue mutex poisoned")
            .get(key)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

/// What a sync event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The tag is not one this layer handles.
    Ignored,
    /// Nothing was queued.
    Empty,
    /// `events` events were delivered.
    Flushed { events: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_peek_serializes_queued_events() {
        let queue = AnalyticsQueue::new();
        assert!(queue.peek("analytics_queue").is_none());

        queue.push("analytics_queue", json!({"event": "click", "id": 1}));
        queue.push("analytics_queue", json!({"event": "view", "id": 2}));
        let blob = queue.peek("analytics_queue").unwrap();
        let parsed: Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed[1]["event"], "view");
        assert_eq!(queue.len("analytics_queue"), 2);
    }

    #[test]
    fn test_take_empties_key_and_restore_keeps_order() {
        let queue = AnalyticsQueue::new();
        queue.push("q", json!(1));
        queue.push("q", json!(2));

        let taken = queue.take("q").unwrap();
        assert_eq!(taken, vec![json!(1), json!(2)]);
        assert!(queue.take("q").is_none());

        queue.push("q", json!(3));
        queue.restore("q", taken);
        assert_eq!(queue.peek("q").unwrap(), "[1,2,3]");
        assert_eq!(queue.len("q"), 3);
    }
}
