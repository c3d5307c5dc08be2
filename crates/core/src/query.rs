//! Edit list queries.

use crate::edit::{EditStatus, Operation, TargetType, VoteType};
use crate::types::{DbId, Page};

string_enum! {
    EditSort {
        CreatedAt => "CREATED_AT",
        UpdatedAt => "UPDATED_AT",
        ClosedAt => "CLOSED_AT",
    }
}

impl EditSort {
    /// Column name in the `edits` table.
    pub fn column(&self) -> &'static str {
        match self {
            EditSort::CreatedAt => "created_at",
            EditSort::UpdatedAt => "updated_at",
            EditSort::ClosedAt => "closed_at",
        }
    }
}

string_enum! {
    SortDirection {
        Asc => "ASC",
        Desc => "DESC",
    }
}

/// Filter for listing edits. All set fields must match.
#[derive(Debug, Clone, PartialEq)]
pub struct EditFilter {
    pub user_id: Option<DbId>,
    pub status: Option<EditStatus>,
    pub operation: Option<Operation>,
    pub target_type: Option<TargetType>,
    /// Requires `target_type`.
    pub target_id: Option<DbId>,
    pub applied: Option<bool>,
    /// Only edits this user voted on with the given vote.
    pub voted: Option<(DbId, VoteType)>,
    pub page: Page,
    pub sort: EditSort,
    pub direction: SortDirection,
}

impl Default for EditFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            status: None,
            operation: None,
            target_type: None,
            target_id: None,
            applied: None,
            voted: None,
            page: Page::default(),
            sort: EditSort::UpdatedAt,
            direction: SortDirection::Desc,
        }
    }
}
