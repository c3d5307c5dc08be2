//! Repository for the `studios` table and its list tables.

use catalog_core::studio::{Studio, StudioRelations};
use catalog_core::types::DbId;
use sqlx::PgConnection;

use super::lists::{self, ListTable};
use crate::models::entity::StudioRow;

const COLUMNS: &str = "id, name, parent_id, deleted, created_at, updated_at";

const ALIASES: ListTable = ("studio_aliases", "studio_id", "alias");
const IMAGES: ListTable = ("studio_images", "studio_id", "image_id");

pub struct StudioRepo;

impl StudioRepo {
    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<StudioRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM studios WHERE id = $1");
        sqlx::query_as::<_, StudioRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a studio and lock its row until the surrounding transaction ends.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<StudioRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM studios WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, StudioRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn create(conn: &mut PgConnection, studio: &Studio) -> Result<StudioRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO studios (name, parent_id) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StudioRow>(&query)
            .bind(&studio.name)
            .bind(studio.parent_id)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn update(conn: &mut PgConnection, studio: &Studio) -> Result<Option<StudioRow>, sqlx::Error> {
        let query = format!(
            "UPDATE studios SET name = $2, parent_id = $3, deleted = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StudioRow>(&query)
            .bind(studio.id)
            .bind(&studio.name)
            .bind(studio.parent_id)
            .bind(studio.deleted)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn relations(conn: &mut PgConnection, id: DbId) -> Result<StudioRelations, sqlx::Error> {
        Ok(StudioRelations {
            aliases: lists::load_strings(conn, ALIASES, id).await?,
            urls: lists::load_urls(conn, "studio_urls", "studio_id", id).await?,
            images: lists::load_ids(conn, IMAGES, id).await?,
        })
    }

    pub async fn save_relations(
        conn: &mut PgConnection,
        id: DbId,
        relations: &StudioRelations,
    ) -> Result<(), sqlx::Error> {
        lists::replace_strings(conn, ALIASES, id, &relations.aliases).await?;
        lists::replace_urls(conn, "studio_urls", "studio_id", id, &relations.urls).await?;
        lists::replace_ids(conn, IMAGES, id, &relations.images).await
    }

    /// Move scenes and child studios from `source` to `target`.
    pub async fn reassign_references(
        conn: &mut PgConnection,
        source: DbId,
        target: DbId,
    ) -> Result<u64, sqlx::Error> {
        let scenes = sqlx::query("UPDATE scenes SET studio_id = $2, updated_at = NOW() WHERE studio_id = $1")
            .bind(source)
            .bind(target)
            .execute(&mut *conn)
            .await?;
        let children = sqlx::query(
            "UPDATE studios SET parent_id = $2, updated_at = NOW()
             WHERE parent_id = $1 AND id <> $2",
        )
        .bind(source)
        .bind(target)
        .execute(&mut *conn)
        .await?;
        Ok(scenes.rows_affected() + children.rows_affected())
    }

    /// Clear the studio from its scenes and child studios.
    pub async fn detach_references(conn: &mut PgConnection, studio_id: DbId) -> Result<u64, sqlx::Error> {
        let scenes = sqlx::query("UPDATE scenes SET studio_id = NULL, updated_at = NOW() WHERE studio_id = $1")
            .bind(studio_id)
            .execute(&mut *conn)
            .await?;
        let children = sqlx::query("UPDATE studios SET parent_id = NULL, updated_at = NOW() WHERE parent_id = $1")
            .bind(studio_id)
            .execute(&mut *conn)
            .await?;
        Ok(scenes.rows_affected() + children.rows_affected())
    }
}
