//! Repository for the `notifications` table.

use catalog_core::notification::NewNotification;
use catalog_core::types::{DbId, Page, Timestamp};
use sqlx::PgConnection;

use crate::models::notification::NotificationRow;

const COLUMNS: &str = "id, user_id, kind, edit_id, read_at, created_at";

pub struct NotificationRepo;

impl NotificationRepo {
    /// Insert a batch of notifications in one statement.
    pub async fn create_batch(
        conn: &mut PgConnection,
        notifications: &[NewNotification],
    ) -> Result<u64, sqlx::Error> {
        if notifications.is_empty() {
            return Ok(0);
        }
        let users: Vec<DbId> = notifications.iter().map(|n| n.user_id).collect();
        let kinds: Vec<&str> = notifications.iter().map(|n| n.kind.as_str()).collect();
        let edits: Vec<DbId> = notifications.iter().map(|n| n.edit_id).collect();
        let result = sqlx::query(
            "INSERT INTO notifications (user_id, kind, edit_id)
             SELECT * FROM UNNEST($1::BIGINT[], $2::TEXT[], $3::BIGINT[])",
        )
        .bind(users)
        .bind(kinds)
        .bind(edits)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_for_user(
        conn: &mut PgConnection,
        user_id: DbId,
        unread_only: bool,
        page: Page,
    ) -> Result<Vec<NotificationRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = $1 AND (NOT $2 OR read_at IS NULL)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, NotificationRow>(&query)
            .bind(user_id)
            .bind(unread_only)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn count_unread(conn: &mut PgConnection, user_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    pub async fn mark_all_read(
        conn: &mut PgConnection,
        user_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = $2 WHERE user_id = $1 AND read_at IS NULL",
        )
        .bind(user_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete notifications created before `cutoff`.
    pub async fn delete_before(conn: &mut PgConnection, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notifications WHERE created_at < $1")
            .bind(cutoff)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
