//! Repository for the per-kind `*_redirects` tables.

use catalog_core::edit::TargetType;
use catalog_core::types::DbId;
use sqlx::PgConnection;

use super::redirect_table;

pub struct RedirectRepo;

impl RedirectRepo {
    /// Target id the merged-away `source_id` points at, if any.
    pub async fn find_target(
        conn: &mut PgConnection,
        target_type: TargetType,
        source_id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let table = redirect_table(target_type);
        let query = format!("SELECT target_id FROM {table} WHERE source_id = $1");
        let row: Option<(DbId,)> = sqlx::query_as(&query)
            .bind(source_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    pub async fn create(
        conn: &mut PgConnection,
        target_type: TargetType,
        source_id: DbId,
        target_id: DbId,
    ) -> Result<(), sqlx::Error> {
        let table = redirect_table(target_type);
        let query = format!(
            "INSERT INTO {table} (source_id, target_id) VALUES ($1, $2)
             ON CONFLICT (source_id) DO UPDATE SET target_id = EXCLUDED.target_id"
        );
        sqlx::query(&query)
            .bind(source_id)
            .bind(target_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Re-point every redirect aimed at `from` to `to`.
    pub async fn retarget(
        conn: &mut PgConnection,
        target_type: TargetType,
        from: DbId,
        to: DbId,
    ) -> Result<u64, sqlx::Error> {
        let table = redirect_table(target_type);
        let query = format!("UPDATE {table} SET target_id = $2 WHERE target_id = $1");
        let result = sqlx::query(&query)
            .bind(from)
            .bind(to)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
