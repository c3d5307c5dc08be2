//! Repository for the `edits`, `*_edits`, `edit_votes` and `edit_comments`
//! tables.

use catalog_core::edit::{Edit, NewEdit, TargetType, VoteType};
use catalog_core::query::EditFilter;
use catalog_core::types::{DbId, Timestamp};
use sqlx::PgConnection;

use super::edit_target_table;
use crate::models::edit::{CommentRow, EditRow, VoteRow};

/// Column list for edits queries.
const EDIT_COLUMNS: &str = "e.id, e.user_id, e.target_type, e.operation, e.status, e.data, \
    e.vote_count, e.applied, e.update_count, e.created_at, e.updated_at, e.closed_at";

const VOTE_COLUMNS: &str = "edit_id, user_id, vote, created_at";

const COMMENT_COLUMNS: &str = "id, edit_id, user_id, text, created_at";

/// Provides CRUD and query operations for edits.
pub struct EditRepo;

impl EditRepo {
    /// Insert a new pending edit, returning the created row.
    pub async fn create(conn: &mut PgConnection, input: &NewEdit) -> Result<EditRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO edits AS e (user_id, target_type, operation, status, data)
             VALUES ($1, $2, $3, 'PENDING', $4)
             RETURNING {EDIT_COLUMNS}"
        );
        sqlx::query_as::<_, EditRow>(&query)
            .bind(input.user_id)
            .bind(input.target_type.as_str())
            .bind(input.operation.as_str())
            .bind(&input.data)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<EditRow>, sqlx::Error> {
        let query = format!("SELECT {EDIT_COLUMNS} FROM edits e WHERE e.id = $1");
        sqlx::query_as::<_, EditRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find an edit and lock its row until the surrounding transaction ends.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<EditRow>, sqlx::Error> {
        let query = format!("SELECT {EDIT_COLUMNS} FROM edits e WHERE e.id = $1 FOR UPDATE");
        sqlx::query_as::<_, EditRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Persist every mutable column of an edit.
    pub async fn update(conn: &mut PgConnection, edit: &Edit) -> Result<Option<EditRow>, sqlx::Error> {
        let query = format!(
            "UPDATE edits AS e SET
                status = $2,
                data = $3,
                vote_count = $4,
                applied = $5,
                update_count = $6,
                closed_at = $7,
                updated_at = NOW()
             WHERE e.id = $1
             RETURNING {EDIT_COLUMNS}"
        );
        sqlx::query_as::<_, EditRow>(&query)
            .bind(edit.id)
            .bind(edit.status.as_str())
            .bind(&edit.data)
            .bind(edit.vote_count)
            .bind(edit.applied)
            .bind(edit.update_count)
            .bind(edit.closed_at)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Link an edit to its target entity.
    pub async fn create_target(
        conn: &mut PgConnection,
        edit_id: DbId,
        target_type: TargetType,
        target_id: DbId,
    ) -> Result<(), sqlx::Error> {
        let (table, column) = edit_target_table(target_type);
        let query = format!(
            "INSERT INTO {table} (edit_id, {column}) VALUES ($1, $2)
             ON CONFLICT (edit_id) DO UPDATE SET {column} = EXCLUDED.{column}"
        );
        sqlx::query(&query)
            .bind(edit_id)
            .bind(target_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn find_target(
        conn: &mut PgConnection,
        edit_id: DbId,
        target_type: TargetType,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let (table, column) = edit_target_table(target_type);
        let query = format!("SELECT {column} FROM {table} WHERE edit_id = $1");
        let row: Option<(DbId,)> = sqlx::query_as(&query)
            .bind(edit_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    /// List edits matching a filter, paginated and sorted.
    pub async fn query(conn: &mut PgConnection, filter: &EditFilter) -> Result<Vec<EditRow>, sqlx::Error> {
        let where_clause = Self::filter_clause(filter);
        let sort = filter.sort.column();
        let direction = filter.direction.as_str();
        let query = format!(
            "SELECT {EDIT_COLUMNS} FROM edits e
             WHERE {where_clause}
             ORDER BY e.{sort} {direction} NULLS LAST, e.id {direction}
             LIMIT $9 OFFSET $10"
        );
        Self::bind_filter(sqlx::query_as::<_, EditRow>(&query), filter)
            .bind(filter.page.limit())
            .bind(filter.page.offset())
            .fetch_all(&mut *conn)
            .await
    }

    /// Count edits matching a filter, ignoring pagination.
    pub async fn count(conn: &mut PgConnection, filter: &EditFilter) -> Result<i64, sqlx::Error> {
        let where_clause = Self::filter_clause(filter);
        let query = format!("SELECT COUNT(*) FROM edits e WHERE {where_clause}");
        let (count,): (i64,) = Self::bind_filter(sqlx::query_as(&query), filter)
            .fetch_one(&mut *conn)
            .await?;
        Ok(count)
    }

    /// Pending edits old enough to close on ordinary votes, plus pending
    /// edits holding an immediate vote. Oldest first.
    pub async fn list_closing_candidates(
        conn: &mut PgConnection,
        created_before: Timestamp,
    ) -> Result<Vec<EditRow>, sqlx::Error> {
        let query = format!(
            "SELECT {EDIT_COLUMNS} FROM edits e
             WHERE e.status = 'PENDING'
               AND (e.created_at <= $1 OR EXISTS (
                    SELECT 1 FROM edit_votes v
                    WHERE v.edit_id = e.id
                      AND v.vote IN ('IMMEDIATE_ACCEPT', 'IMMEDIATE_REJECT')))
             ORDER BY e.created_at ASC"
        );
        sqlx::query_as::<_, EditRow>(&query)
            .bind(created_before)
            .fetch_all(&mut *conn)
            .await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// WHERE clause over parameters $1..$8; unset parameters are NULL.
    fn filter_clause(filter: &EditFilter) -> String {
        let mut clause = String::from(
            "($1::BIGINT IS NULL OR e.user_id = $1)
               AND ($2::TEXT IS NULL OR e.status = $2)
               AND ($3::TEXT IS NULL OR e.operation = $3)
               AND ($4::TEXT IS NULL OR e.target_type = $4)
               AND ($6::BOOLEAN IS NULL OR e.applied = $6)
               AND ($7::BIGINT IS NULL OR EXISTS (
                    SELECT 1 FROM edit_votes v
                    WHERE v.edit_id = e.id AND v.user_id = $7 AND v.vote = $8))",
        );
        match filter.target_type {
            Some(target_type) => {
                let (table, column) = edit_target_table(target_type);
                clause.push_str(&format!(
                    " AND ($5::BIGINT IS NULL OR EXISTS (
                        SELECT 1 FROM {table} t WHERE t.edit_id = e.id AND t.{column} = $5))"
                ));
            }
            // A target id without a target type matches every edit.
            None => clause.push_str(" AND ($5::BIGINT IS NULL OR TRUE)"),
        }
        clause
    }

    fn bind_filter<'q, O>(
        query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
        filter: &'q EditFilter,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
        query
            .bind(filter.user_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.operation.map(|o| o.as_str()))
            .bind(filter.target_type.map(|t| t.as_str()))
            .bind(filter.target_id)
            .bind(filter.applied)
            .bind(filter.voted.map(|(user_id, _)| user_id))
            .bind(filter.voted.map(|(_, vote)| vote.as_str()))
    }
}

/// Provides upsert and list operations for edit votes.
pub struct VoteRepo;

impl VoteRepo {
    /// Insert or replace a user's vote. One row per (edit, user).
    pub async fn upsert(
        conn: &mut PgConnection,
        edit_id: DbId,
        user_id: DbId,
        vote: VoteType,
    ) -> Result<VoteRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO edit_votes (edit_id, user_id, vote)
             VALUES ($1, $2, $3)
             ON CONFLICT (edit_id, user_id)
             DO UPDATE SET vote = EXCLUDED.vote, created_at = NOW()
             RETURNING {VOTE_COLUMNS}"
        );
        sqlx::query_as::<_, VoteRow>(&query)
            .bind(edit_id)
            .bind(user_id)
            .bind(vote.as_str())
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn list_for_edit(conn: &mut PgConnection, edit_id: DbId) -> Result<Vec<VoteRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VOTE_COLUMNS} FROM edit_votes WHERE edit_id = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, VoteRow>(&query)
            .bind(edit_id)
            .fetch_all(&mut *conn)
            .await
    }

    pub async fn delete_for_edit(conn: &mut PgConnection, edit_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM edit_votes WHERE edit_id = $1")
            .bind(edit_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Provides create and list operations for edit comments.
pub struct CommentRepo;

impl CommentRepo {
    pub async fn create(
        conn: &mut PgConnection,
        edit_id: DbId,
        user_id: Option<DbId>,
        text: &str,
    ) -> Result<CommentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO edit_comments (edit_id, user_id, text)
             VALUES ($1, $2, $3)
             RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(edit_id)
            .bind(user_id)
            .bind(text)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn list_for_edit(conn: &mut PgConnection, edit_id: DbId) -> Result<Vec<CommentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM edit_comments WHERE edit_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, CommentRow>(&query)
            .bind(edit_id)
            .fetch_all(&mut *conn)
            .await
    }
}
