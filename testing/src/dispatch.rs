//! Recording dispatcher for asserting on dispatched events.

use fetch_lifecycle_runtime::Dispatch;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Captures every dispatched lifecycle event for later assertion.
///
/// Clone-able; clones share the same capture buffer, so a clone can be
/// handed to a controller while the original stays behind for assertions.
///
/// # Example
///
/// ```ignore
/// let dispatcher = RecordingDispatcher::new();
/// let controller = LifecycleController::with_transport(
///     transport,
///     dispatcher.dispatch_fn(),
///     Arc::new(|| ()),
/// );
///
/// controller.run(request).await?;
/// assert_eq!(dispatcher.event_types(), ["FETCH_REQUEST", "FETCH_RESOLVE"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RecordingDispatcher {
    events: Arc<Mutex<Vec<Value>>>,
}

impl RecordingDispatcher {
    /// Create a dispatcher with an empty capture buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `Dispatch` callback to hand to a controller.
    #[must_use]
    pub fn dispatch_fn(&self) -> Dispatch {
        let events = Arc::clone(&self.events);
        Arc::new(move |event| {
            events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        })
    }

    /// Snapshot of all captured events, in dispatch order.
    #[must_use]
    pub fn events(&self) -> Vec<Value> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The `type` field of each captured event, in dispatch order.
    ///
    /// Events without a string `type` (possible after a transform spec)
    /// contribute an empty string.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|event| event["type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Number of captured events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based dispatch index of the first event with this type.
    #[must_use]
    pub fn index_of_type(&self, action_type: &str) -> Option<usize> {
        self.event_types()
            .iter()
            .position(|candidate| candidate == action_type)
            .map(|index| index + 1)
    }

    /// Wait until an event with this type has been dispatched.
    ///
    /// Polls the capture buffer until the event shows up or the timeout
    /// elapses. Returns whether the event was observed. Useful for events
    /// dispatched from a racing task, where completion of the run does not
    /// imply the event has landed yet.
    pub async fn wait_for_type(&self, action_type: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self
                .event_types()
                .iter()
                .any(|candidate| candidate == action_type)
            {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}
