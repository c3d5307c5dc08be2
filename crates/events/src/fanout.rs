//! Turns edit events into per-user notification rows.
//!
//! [`NotificationFanout`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and, for each edit event, works out who should hear about it and writes
//! one [`NewNotification`] per recipient. A user receives at most one
//! notification per event; when several rules match, the first rule in
//! priority order wins.

use std::collections::BTreeMap;

use catalog_core::edit::{EditComment, EditStatus, EditVote, VoteType};
use catalog_core::notification::{NewNotification, NotificationType};
use catalog_core::store::{CatalogStore, CatalogTx, EditRepository, NotificationRepository, StoreResult};
use catalog_core::types::DbId;
use tokio::sync::broadcast;

use crate::bus::{event_types, PlatformEvent};
use crate::notifier::EditEventPayload;

// ---------------------------------------------------------------------------
// Recipient rules
// ---------------------------------------------------------------------------

/// Collects recipients, keeping the first kind assigned to each user.
struct Recipients {
    edit_id: DbId,
    excluded: Option<DbId>,
    by_user: BTreeMap<DbId, NotificationType>,
}

impl Recipients {
    fn new(edit_id: DbId, excluded: Option<DbId>) -> Self {
        Self {
            edit_id,
            excluded,
            by_user: BTreeMap::new(),
        }
    }

    fn add(&mut self, user_id: DbId, kind: NotificationType) {
        if Some(user_id) == self.excluded {
            return;
        }
        self.by_user.entry(user_id).or_insert(kind);
    }

    fn into_notifications(self) -> Vec<NewNotification> {
        let edit_id = self.edit_id;
        self.by_user
            .into_iter()
            .map(|(user_id, kind)| NewNotification {
                user_id,
                kind,
                edit_id,
            })
            .collect()
    }
}

/// Recipients of a new comment: the edit's author, then earlier commenters,
/// then users who cast a non-abstain vote. The commenter is never notified.
pub fn comment_recipients(
    edit_id: DbId,
    author_id: DbId,
    commenter_id: Option<DbId>,
    comments: &[EditComment],
    votes: &[EditVote],
) -> Vec<NewNotification> {
    let mut recipients = Recipients::new(edit_id, commenter_id);
    recipients.add(author_id, NotificationType::CommentOwnEdit);
    for user_id in comments.iter().filter_map(|c| c.user_id) {
        recipients.add(user_id, NotificationType::CommentCommentedEdit);
    }
    for vote in votes.iter().filter(|v| v.vote != VoteType::Abstain) {
        recipients.add(vote.user_id, NotificationType::CommentVotedEdit);
    }
    recipients.into_notifications()
}

/// Recipients of an event that needs no further lookups.
pub fn event_recipients(
    event_type: &str,
    edit_id: DbId,
    actor: Option<DbId>,
    payload: &EditEventPayload,
) -> Vec<NewNotification> {
    let mut recipients = Recipients::new(edit_id, actor);
    match event_type {
        event_types::EDIT_DOWNVOTED => {
            recipients.add(payload.author_id, NotificationType::DownvoteOwnEdit);
        }
        event_types::EDIT_APPLIED => {
            if matches!(
                payload.status,
                EditStatus::Failed | EditStatus::Rejected | EditStatus::ImmediateRejected
            ) {
                recipients.add(payload.author_id, NotificationType::FailedOwnEdit);
            }
        }
        event_types::EDIT_CANCELED => {
            // Canceled means the author withdrew the edit themselves.
            if payload.status != EditStatus::Canceled {
                recipients.add(payload.author_id, NotificationType::FailedOwnEdit);
            }
        }
        event_types::EDIT_UPDATED => {
            for user_id in &payload.previous_voters {
                if *user_id != payload.author_id {
                    recipients.add(*user_id, NotificationType::UpdatedEdit);
                }
            }
        }
        _ => {}
    }
    recipients.into_notifications()
}

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

/// Background service that writes notifications for edit events.
pub struct NotificationFanout;

impl NotificationFanout {
    /// Run the fan-out loop until the bus is dropped.
    pub async fn run<S: CatalogStore>(store: S, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::deliver(&store, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            edit_id = ?event.source_entity_id,
                            "Failed to write edit notifications"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Notification fan-out lagged, some events were not delivered"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification fan-out shutting down");
                    break;
                }
            }
        }
    }

    /// Write the notifications for one event. Returns the number written.
    pub async fn deliver<S: CatalogStore>(store: &S, event: &PlatformEvent) -> StoreResult<u64> {
        let Some(edit_id) = event.source_entity_id else {
            return Ok(0);
        };
        if event.event_type == event_types::EDIT_CREATED {
            tracing::debug!(edit_id, "Edit created, no subscribers to notify");
            return Ok(0);
        }
        let payload: EditEventPayload = match serde_json::from_value(event.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, edit_id, event_type = %event.event_type, "Ignoring malformed edit event");
                return Ok(0);
            }
        };

        let mut tx = store.begin().await?;
        let notifications = if event.event_type == event_types::EDIT_COMMENTED {
            let comments = tx.list_comments(edit_id).await?;
            let votes = tx.list_votes(edit_id).await?;
            comment_recipients(edit_id, payload.author_id, event.actor_user_id, &comments, &votes)
        } else {
            event_recipients(&event.event_type, edit_id, event.actor_user_id, &payload)
        };
        if notifications.is_empty() {
            return Ok(0);
        }

        let written = tx.create_notifications(&notifications).await?;
        tx.commit().await?;
        tracing::debug!(edit_id, written, event_type = %event.event_type, "Edit notifications written");
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
