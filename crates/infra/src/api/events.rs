//! Application event bus
//!
//! The client publishes a small set of events for whatever UI surfaces are
//! listening; it has no knowledge of the subscribers. Publishing with no
//! subscribers is not an error.

use once_cell::sync::Lazy;
use serde::Serialize;
use smsdesk_domain::constants::{EVENT_API_ERROR, EVENT_BUS_CAPACITY};
use tokio::sync::broadcast;
use tracing::trace;

/// Event published to the rest of the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AppEvent {
    /// A classified API failure; carries only the user-facing message
    ApiError { message: String },
}

impl AppEvent {
    /// `api-error` event carrying `message`
    pub fn api_error(message: impl Into<String>) -> Self {
        Self::ApiError { message: message.into() }
    }

    /// Event name as seen by listeners
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApiError { .. } => EVENT_API_ERROR,
        }
    }
}

static GLOBAL_BUS: Lazy<EventBus> = Lazy::new(EventBus::default);

/// Publish/subscribe channel for [`AppEvent`]s. Clones share the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_BUS_CAPACITY)
    }
}

impl EventBus {
    /// Create a bus retaining up to `capacity` undelivered events per
    /// subscriber; slower subscribers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Process-wide bus
    pub fn global() -> &'static EventBus {
        &GLOBAL_BUS
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; returns the number of subscribers that received it
    pub fn publish(&self, event: AppEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!(event = name, "event published with no subscribers");
                0
            }
        }
    }

    /// Number of live subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.clone().subscribe();

        assert_eq!(bus.publish(AppEvent::api_error("Please try again.")), 2);

        let expected = AppEvent::ApiError { message: "Please try again.".to_string() };
        assert_eq!(first.recv().await.unwrap(), expected);
        assert_eq!(second.recv().await.unwrap(), expected);
    }

    #[test]
    fn publishing_without_subscribers_is_not_an_error() {
        let bus = EventBus::default();
        assert_eq!(bus.receiver_count(), 0);
        assert_eq!(bus.publish(AppEvent::api_error("ignored")), 0);
    }

    #[test]
    fn event_name_and_payload_shape() {
        let event = AppEvent::api_error("Not found");
        assert_eq!(event.name(), "api-error");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({"type": "api-error", "message": "Not found"})
        );
    }

    #[test]
    fn global_bus_is_shared() {
        let receiver = EventBus::global().subscribe();
        assert!(EventBus::global().receiver_count() >= 1);
        drop(receiver);
    }
}
