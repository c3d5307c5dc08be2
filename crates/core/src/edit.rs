//! Edit records, votes and comments.
//!
//! An edit is a proposed change to one catalog entity. It carries a typed
//! diff payload (see the per-kind modules) serialized as JSON, and moves
//! from `PENDING` into exactly one terminal status.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::performer::PerformerEditData;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

string_enum! {
    /// Kind of catalog entity an edit targets.
    TargetType {
        Tag => "TAG",
        Performer => "PERFORMER",
        Studio => "STUDIO",
        Scene => "SCENE",
    }
}

impl TargetType {
    /// Entity name used in error messages.
    pub fn entity_name(&self) -> &'static str {
        match self {
            TargetType::Tag => "Tag",
            TargetType::Performer => "Performer",
            TargetType::Studio => "Studio",
            TargetType::Scene => "Scene",
        }
    }
}

string_enum! {
    Operation {
        Create => "CREATE",
        Modify => "MODIFY",
        Merge => "MERGE",
        Destroy => "DESTROY",
    }
}

impl Operation {
    /// Whether the operation acts on an existing entity.
    pub fn requires_target(&self) -> bool {
        !matches!(self, Operation::Create)
    }
}

string_enum! {
    EditStatus {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
        ImmediateAccepted => "IMMEDIATE_ACCEPTED",
        ImmediateRejected => "IMMEDIATE_REJECTED",
        Failed => "FAILED",
        Canceled => "CANCELED",
    }
}

impl EditStatus {
    /// True for every status except `PENDING`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EditStatus::Pending)
    }

    /// True for the statuses whose changes reached the catalog.
    pub fn is_applied(&self) -> bool {
        matches!(self, EditStatus::Accepted | EditStatus::ImmediateAccepted)
    }
}

string_enum! {
    VoteType {
        Accept => "ACCEPT",
        Reject => "REJECT",
        Abstain => "ABSTAIN",
        ImmediateAccept => "IMMEDIATE_ACCEPT",
        ImmediateReject => "IMMEDIATE_REJECT",
    }
}

impl VoteType {
    pub fn is_immediate(&self) -> bool {
        matches!(self, VoteType::ImmediateAccept | VoteType::ImmediateReject)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edit {
    pub id: DbId,
    pub user_id: DbId,
    pub target_type: TargetType,
    pub operation: Operation,
    pub status: EditStatus,
    pub data: serde_json::Value,
    /// Net votes: accepts minus rejects.
    pub vote_count: i32,
    pub applied: bool,
    pub update_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub closed_at: Option<Timestamp>,
}

impl Edit {
    pub fn is_pending(&self) -> bool {
        self.status == EditStatus::Pending
    }

    /// Decode the diff payload into its per-kind type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, CoreError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            CoreError::Internal(format!("Edit {} has malformed data: {e}", self.id))
        })
    }

    /// Move a pending edit into a terminal status.
    ///
    /// Fails with `Conflict` if the edit was already closed.
    pub fn close(&mut self, status: EditStatus, now: Timestamp) -> Result<(), CoreError> {
        if !self.is_pending() {
            return Err(CoreError::Conflict(format!(
                "Edit {} is already closed with status {}",
                self.id, self.status
            )));
        }
        if !status.is_terminal() {
            return Err(CoreError::Internal(format!(
                "Cannot close edit {} as {status}",
                self.id
            )));
        }
        self.status = status;
        self.applied = status.is_applied();
        self.closed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Whether the edit removes or rewrites an entity's identity and must
    /// wait out the longer voting period.
    ///
    /// Destroy and Merge are always destructive. A performer rename is
    /// destructive unless it also moves the old name into the alias list.
    pub fn is_destructive(&self) -> bool {
        match self.operation {
            Operation::Destroy | Operation::Merge => true,
            Operation::Create => false,
            Operation::Modify => match self.target_type {
                TargetType::Performer => self
                    .data_as::<PerformerEditData>()
                    .map(|data| data.is_unaliased_rename())
                    .unwrap_or(false),
                _ => false,
            },
        }
    }
}

/// Fields needed to insert a new edit. Status starts as `PENDING`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdit {
    pub user_id: DbId,
    pub target_type: TargetType,
    pub operation: Operation,
    pub data: serde_json::Value,
}

/// One user's vote on an edit. Each user holds at most one vote per edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditVote {
    pub edit_id: DbId,
    pub user_id: DbId,
    pub vote: VoteType,
    pub created_at: Timestamp,
}

/// A comment on an edit. `user_id` is `None` for system comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditComment {
    pub id: DbId,
    pub edit_id: DbId,
    pub user_id: Option<DbId>,
    pub text: String,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn pending(operation: Operation, target_type: TargetType, data: serde_json::Value) -> Edit {
        let now = Utc::now();
        Edit {
            id: 1,
            user_id: 10,
            target_type,
            operation,
            status: EditStatus::Pending,
            data,
            vote_count: 0,
            applied: false,
            update_count: 0,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }

    #[test]
    fn close_sets_applied_only_for_accepting_statuses() {
        let mut edit = pending(Operation::Create, TargetType::Tag, json!({}));
        edit.close(EditStatus::ImmediateAccepted, Utc::now()).unwrap();
        assert!(edit.applied);
        assert!(edit.closed_at.is_some());

        let mut edit = pending(Operation::Create, TargetType::Tag, json!({}));
        edit.close(EditStatus::Failed, Utc::now()).unwrap();
        assert!(!edit.applied);
    }

    #[test]
    fn closed_edit_cannot_close_again() {
        let mut edit = pending(Operation::Create, TargetType::Tag, json!({}));
        edit.close(EditStatus::Rejected, Utc::now()).unwrap();
        assert_matches!(
            edit.close(EditStatus::Accepted, Utc::now()),
            Err(CoreError::Conflict(_))
        );
        assert_eq!(edit.status, EditStatus::Rejected);
    }

    #[test]
    fn destroy_and_merge_are_destructive() {
        assert!(pending(Operation::Destroy, TargetType::Tag, json!({})).is_destructive());
        assert!(pending(Operation::Merge, TargetType::Studio, json!({})).is_destructive());
        assert!(!pending(Operation::Create, TargetType::Scene, json!({})).is_destructive());
    }

    #[test]
    fn performer_rename_without_alias_is_destructive() {
        let data = json!({ "old": { "name": "Jane" }, "new": { "name": "Janet" } });
        assert!(pending(Operation::Modify, TargetType::Performer, data).is_destructive());

        let data = json!({
            "old": { "name": "Jane" },
            "new": { "name": "Janet" },
            "set_modify_aliases": true
        });
        assert!(!pending(Operation::Modify, TargetType::Performer, data).is_destructive());
    }

    #[test]
    fn status_strings_are_screaming_snake() {
        assert_eq!(EditStatus::ImmediateAccepted.as_str(), "IMMEDIATE_ACCEPTED");
        assert_eq!("CANCELED".parse::<EditStatus>().unwrap(), EditStatus::Canceled);
    }
}
