use catalog_core::notification::Notification;
use catalog_core::store::StoreError;
use catalog_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::parse_column;

/// A row from the `notifications` table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub edit_id: DbId,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            kind: parse_column("notifications.kind", &row.kind)?,
            edit_id: row.edit_id,
            read_at: row.read_at,
            created_at: row.created_at,
        })
    }
}
