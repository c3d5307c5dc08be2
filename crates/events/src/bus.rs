//! Edit lifecycle events and the channel that carries them.
//!
//! The engine publishes a [`PlatformEvent`] after each committed edit
//! transition. Consumers like the notification fan-out hold their own
//! receiver; the bus itself keeps no history.

use catalog_core::types::{DbId, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event names published for edit lifecycle steps.
pub mod event_types {
    pub const EDIT_CREATED: &str = "edit.created";
    /// An edit closed through the closing policy or force-apply, whether it
    /// was applied, rejected or failed.
    pub const EDIT_APPLIED: &str = "edit.applied";
    pub const EDIT_CANCELED: &str = "edit.canceled";
    pub const EDIT_UPDATED: &str = "edit.updated";
    pub const EDIT_DOWNVOTED: &str = "edit.downvoted";
    pub const EDIT_COMMENTED: &str = "edit.commented";
}

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// One edit transition as seen by subscribers. Edit events always set the
/// source to the edit; the actor is left empty for background closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"edit.commented"`.
    pub event_type: String,

    /// Source entity kind, `"edit"` for every edit event.
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    pub actor_user_id: Option<DbId>,

    pub payload: serde_json::Value,

    pub timestamp: Timestamp,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

const DEFAULT_CAPACITY: usize = 1024;

/// Broadcast channel for [`PlatformEvent`]s, usually held as `Arc<EventBus>`.
///
/// A receiver that falls `capacity` events behind gets
/// `RecvError::Lagged` and misses the overwritten events.
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Events published while nobody is subscribed are lost.
    pub fn publish(&self, event: PlatformEvent) {
        // Err here just means no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::RecvError;

    use super::*;

    fn commented(edit_id: DbId) -> PlatformEvent {
        PlatformEvent::new(event_types::EDIT_COMMENTED)
            .with_source("edit", edit_id)
            .with_actor(7)
            .with_payload(serde_json::json!({ "comment_id": 3 }))
    }

    #[tokio::test]
    async fn subscriber_sees_edit_event_fields() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(commented(42));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, "edit.commented");
        assert_eq!(received.source_entity_type.as_deref(), Some("edit"));
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.actor_user_id, Some(7));
        assert_eq!(received.payload["comment_id"], 3);
    }

    #[tokio::test]
    async fn every_subscriber_gets_its_own_copy() {
        let bus = EventBus::default();
        let mut fanout = bus.subscribe();
        let mut audit = bus.subscribe();

        bus.publish(PlatformEvent::new(event_types::EDIT_CREATED));

        assert_eq!(fanout.recv().await.unwrap().event_type, event_types::EDIT_CREATED);
        assert_eq!(audit.recv().await.unwrap().event_type, event_types::EDIT_CREATED);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::default();
        bus.publish(commented(1));

        let mut rx = bus.subscribe();
        bus.publish(commented(2));

        assert_eq!(rx.recv().await.unwrap().source_entity_id, Some(2));
    }

    #[tokio::test]
    async fn slow_subscriber_reports_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for edit_id in 1..=3 {
            bus.publish(commented(edit_id));
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(rx.recv().await.unwrap().source_entity_id, Some(2));
    }

    #[test]
    fn bare_event_has_object_payload_and_no_source() {
        let event = PlatformEvent::new("edit.created");
        assert!(event.source_entity_type.is_none());
        assert!(event.source_entity_id.is_none());
        assert!(event.actor_user_id.is_none());
        assert!(event.payload.is_object());
    }
}
