//! [`EditNotifier`] implementation that publishes to the [`EventBus`].

use std::sync::Arc;

use catalog_core::edit::{Edit, EditComment, EditStatus, EditVote, Operation, TargetType, VoteType};
use catalog_core::notify::EditNotifier;
use catalog_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::bus::{event_types, EventBus, PlatformEvent};

/// Payload carried by every edit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditEventPayload {
    pub author_id: DbId,
    pub target_type: TargetType,
    pub operation: Operation,
    pub status: EditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote: Option<VoteType>,
    /// Voters whose votes an update discarded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_voters: Vec<DbId>,
    /// Why a failed edit could not be applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EditEventPayload {
    pub fn from_edit(edit: &Edit) -> Self {
        Self {
            author_id: edit.user_id,
            target_type: edit.target_type,
            operation: edit.operation,
            status: edit.status,
            comment_id: None,
            vote: None,
            previous_voters: Vec::new(),
            reason: None,
        }
    }
}

/// Publishes one [`PlatformEvent`] per edit lifecycle step.
#[derive(Clone)]
pub struct BusNotifier {
    bus: Arc<EventBus>,
}

impl BusNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    fn publish(&self, event_type: &str, edit: &Edit, actor: Option<DbId>, payload: EditEventPayload) {
        let payload = match serde_json::to_value(&payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(error = %e, edit_id = edit.id, event_type, "Failed to encode edit event");
                return;
            }
        };
        let mut event = PlatformEvent::new(event_type)
            .with_source("edit", edit.id)
            .with_payload(payload);
        if let Some(user_id) = actor {
            event = event.with_actor(user_id);
        }
        self.bus.publish(event);
    }
}

impl EditNotifier for BusNotifier {
    fn on_create_edit(&self, edit: &Edit) {
        self.publish(
            event_types::EDIT_CREATED,
            edit,
            Some(edit.user_id),
            EditEventPayload::from_edit(edit),
        );
    }

    fn on_apply_edit(&self, edit: &Edit, reason: Option<&str>) {
        let payload = EditEventPayload {
            reason: reason.map(str::to_string),
            ..EditEventPayload::from_edit(edit)
        };
        self.publish(event_types::EDIT_APPLIED, edit, None, payload);
    }

    fn on_cancel_edit(&self, edit: &Edit) {
        self.publish(event_types::EDIT_CANCELED, edit, None, EditEventPayload::from_edit(edit));
    }

    fn on_update_edit(&self, edit: &Edit, previous_voters: &[DbId]) {
        let payload = EditEventPayload {
            previous_voters: previous_voters.to_vec(),
            ..EditEventPayload::from_edit(edit)
        };
        self.publish(event_types::EDIT_UPDATED, edit, Some(edit.user_id), payload);
    }

    fn on_edit_downvote(&self, edit: &Edit, vote: &EditVote) {
        let payload = EditEventPayload {
            vote: Some(vote.vote),
            ..EditEventPayload::from_edit(edit)
        };
        self.publish(event_types::EDIT_DOWNVOTED, edit, Some(vote.user_id), payload);
    }

    fn on_edit_comment(&self, edit: &Edit, comment: &EditComment) {
        let payload = EditEventPayload {
            comment_id: Some(comment.id),
            ..EditEventPayload::from_edit(edit)
        };
        self.publish(event_types::EDIT_COMMENTED, edit, comment.user_id, payload);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn edit() -> Edit {
        let now = Utc::now();
        Edit {
            id: 10,
            user_id: 1,
            target_type: TargetType::Performer,
            operation: Operation::Modify,
            status: EditStatus::Pending,
            data: serde_json::json!({}),
            vote_count: 0,
            applied: false,
            update_count: 1,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    #[tokio::test]
    async fn comment_event_carries_commenter_and_comment_id() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let notifier = BusNotifier::new(Arc::clone(&bus));

        let comment = EditComment {
            id: 77,
            edit_id: 10,
            user_id: Some(5),
            text: "Source?".to_string(),
            created_at: Utc::now(),
        };
        notifier.on_edit_comment(&edit(), &comment);

        let event = rx.recv().await.expect("should receive the event");
        assert_eq!(event.event_type, event_types::EDIT_COMMENTED);
        assert_eq!(event.source_entity_id, Some(10));
        assert_eq!(event.actor_user_id, Some(5));
        let payload: EditEventPayload = serde_json::from_value(event.payload).unwrap();
        assert_eq!(payload.comment_id, Some(77));
        assert_eq!(payload.author_id, 1);
        assert_eq!(payload.target_type, TargetType::Performer);
    }

    #[tokio::test]
    async fn update_event_lists_previous_voters() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let notifier = BusNotifier::new(Arc::clone(&bus));

        notifier.on_update_edit(&edit(), &[3, 4]);

        let event = rx.recv().await.expect("should receive the event");
        assert_eq!(event.event_type, event_types::EDIT_UPDATED);
        assert_eq!(event.payload["previous_voters"], serde_json::json!([3, 4]));
        assert_eq!(event.payload["status"], "PENDING");
    }

    #[tokio::test]
    async fn applied_event_has_no_actor() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let notifier = BusNotifier::new(Arc::clone(&bus));

        let mut failed = edit();
        failed.close(EditStatus::Failed, Utc::now()).unwrap();
        notifier.on_apply_edit(&failed, Some("Tag 4 has been deleted"));

        let event = rx.recv().await.expect("should receive the event");
        assert_eq!(event.event_type, event_types::EDIT_APPLIED);
        assert!(event.actor_user_id.is_none());
        assert_eq!(event.payload["status"], "FAILED");
        assert_eq!(event.payload["reason"], "Tag 4 has been deleted");
    }

    #[tokio::test]
    async fn accepted_event_omits_reason() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let notifier = BusNotifier::new(Arc::clone(&bus));

        let mut accepted = edit();
        accepted.close(EditStatus::Accepted, Utc::now()).unwrap();
        notifier.on_apply_edit(&accepted, None);

        let event = rx.recv().await.expect("should receive the event");
        assert!(event.payload.get("reason").is_none());
        let payload: EditEventPayload = serde_json::from_value(event.payload).unwrap();
        assert_eq!(payload.status, EditStatus::Accepted);
        assert_eq!(payload.reason, None);
    }
}
