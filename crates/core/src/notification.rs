//! User notifications produced by edit activity.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

string_enum! {
    NotificationType {
        CommentOwnEdit => "COMMENT_OWN_EDIT",
        CommentCommentedEdit => "COMMENT_COMMENTED_EDIT",
        CommentVotedEdit => "COMMENT_VOTED_EDIT",
        DownvoteOwnEdit => "DOWNVOTE_OWN_EDIT",
        FailedOwnEdit => "FAILED_OWN_EDIT",
        UpdatedEdit => "UPDATED_EDIT",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: NotificationType,
    /// The edit the notification is about.
    pub edit_id: DbId,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: DbId,
    pub kind: NotificationType,
    pub edit_id: DbId,
}
