//! Rows from `edits`, `edit_votes` and `edit_comments`.

use catalog_core::edit::{Edit, EditComment, EditVote};
use catalog_core::store::StoreError;
use catalog_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_column;

/// A row from the `edits` table.
#[derive(Debug, Clone, FromRow)]
pub struct EditRow {
    pub id: DbId,
    pub user_id: DbId,
    pub target_type: String,
    pub operation: String,
    pub status: String,
    pub data: serde_json::Value,
    pub vote_count: i32,
    pub applied: bool,
    pub update_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub closed_at: Option<Timestamp>,
}

impl TryFrom<EditRow> for Edit {
    type Error = StoreError;

    fn try_from(row: EditRow) -> Result<Self, Self::Error> {
        Ok(Edit {
            id: row.id,
            user_id: row.user_id,
            target_type: parse_column("edits.target_type", &row.target_type)?,
            operation: parse_column("edits.operation", &row.operation)?,
            status: parse_column("edits.status", &row.status)?,
            data: row.data,
            vote_count: row.vote_count,
            applied: row.applied,
            update_count: row.update_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            closed_at: row.closed_at,
        })
    }
}

/// A row from the `edit_votes` table.
#[derive(Debug, Clone, FromRow)]
pub struct VoteRow {
    pub edit_id: DbId,
    pub user_id: DbId,
    pub vote: String,
    pub created_at: Timestamp,
}

impl TryFrom<VoteRow> for EditVote {
    type Error = StoreError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(EditVote {
            edit_id: row.edit_id,
            user_id: row.user_id,
            vote: parse_column("edit_votes.vote", &row.vote)?,
            created_at: row.created_at,
        })
    }
}

/// A row from the `edit_comments` table.
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: DbId,
    pub edit_id: DbId,
    pub user_id: Option<DbId>,
    pub text: String,
    pub created_at: Timestamp,
}

impl From<CommentRow> for EditComment {
    fn from(row: CommentRow) -> Self {
        EditComment {
            id: row.id,
            edit_id: row.edit_id,
            user_id: row.user_id,
            text: row.text,
            created_at: row.created_at,
        }
    }
}
