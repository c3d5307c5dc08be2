//! Repository for the `tags`, `tag_aliases` and `scene_tags` tables.

use catalog_core::tag::{Tag, TagRelations};
use catalog_core::types::DbId;
use sqlx::PgConnection;

use super::lists::{self, ListTable};
use crate::models::entity::TagRow;

const COLUMNS: &str = "id, name, description, category_id, deleted, created_at, updated_at";

const ALIASES: ListTable = ("tag_aliases", "tag_id", "alias");

pub struct TagRepo;

impl TagRepo {
    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<TagRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1");
        sqlx::query_as::<_, TagRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a tag and lock its row until the surrounding transaction ends.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<TagRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tags WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, TagRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn create(conn: &mut PgConnection, tag: &Tag) -> Result<TagRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO tags (name, description, category_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TagRow>(&query)
            .bind(&tag.name)
            .bind(&tag.description)
            .bind(tag.category_id)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn update(conn: &mut PgConnection, tag: &Tag) -> Result<Option<TagRow>, sqlx::Error> {
        let query = format!(
            "UPDATE tags SET name = $2, description = $3, category_id = $4, deleted = $5,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TagRow>(&query)
            .bind(tag.id)
            .bind(&tag.name)
            .bind(&tag.description)
            .bind(tag.category_id)
            .bind(tag.deleted)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn relations(conn: &mut PgConnection, id: DbId) -> Result<TagRelations, sqlx::Error> {
        Ok(TagRelations {
            aliases: lists::load_strings(conn, ALIASES, id).await?,
        })
    }

    pub async fn save_relations(
        conn: &mut PgConnection,
        id: DbId,
        relations: &TagRelations,
    ) -> Result<(), sqlx::Error> {
        lists::replace_strings(conn, ALIASES, id, &relations.aliases).await
    }

    /// Re-point scene tags from `source` to `target`.
    ///
    /// Scenes already tagged with `target` keep their single row; the
    /// leftover `source` rows are deleted.
    pub async fn reassign_scene_tags(
        conn: &mut PgConnection,
        source: DbId,
        target: DbId,
    ) -> Result<u64, sqlx::Error> {
        let moved = sqlx::query(
            "UPDATE scene_tags SET tag_id = $2
             WHERE tag_id = $1
               AND scene_id NOT IN (SELECT scene_id FROM scene_tags WHERE tag_id = $2)",
        )
        .bind(source)
        .bind(target)
        .execute(&mut *conn)
        .await?;
        lists::clear(conn, "scene_tags", "tag_id", source).await?;
        Ok(moved.rows_affected())
    }

    pub async fn delete_scene_tags(conn: &mut PgConnection, tag_id: DbId) -> Result<u64, sqlx::Error> {
        lists::clear(conn, "scene_tags", "tag_id", tag_id).await
    }
}
