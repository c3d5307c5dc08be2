//! Repository for the `scenes` table and its list tables.

use catalog_core::relations::PerformerAppearance;
use catalog_core::scene::{Scene, SceneRelations};
use catalog_core::types::DbId;
use sqlx::PgConnection;

use super::lists::{self, ListTable};
use crate::models::entity::{AppearanceRow, SceneRow};

const COLUMNS: &str = "id, title, details, date, date_accuracy, studio_id, duration, director, \
    code, deleted, created_at, updated_at";

const TAGS: ListTable = ("scene_tags", "scene_id", "tag_id");
const IMAGES: ListTable = ("scene_images", "scene_id", "image_id");

pub struct SceneRepo;

impl SceneRepo {
    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<SceneRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1");
        sqlx::query_as::<_, SceneRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a scene and lock its row until the surrounding transaction ends.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<SceneRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scenes WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, SceneRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn create(conn: &mut PgConnection, scene: &Scene) -> Result<SceneRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO scenes (title, details, date, date_accuracy, studio_id, duration, director, code)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SceneRow>(&query)
            .bind(&scene.title)
            .bind(&scene.details)
            .bind(scene.date.as_ref().map(|d| d.date.clone()))
            .bind(scene.date.as_ref().map(|d| d.accuracy.as_str()))
            .bind(scene.studio_id)
            .bind(scene.duration)
            .bind(&scene.director)
            .bind(&scene.code)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn update(conn: &mut PgConnection, scene: &Scene) -> Result<Option<SceneRow>, sqlx::Error> {
        let query = format!(
            "UPDATE scenes SET
                title = $2, details = $3, date = $4, date_accuracy = $5, studio_id = $6,
                duration = $7, director = $8, code = $9, deleted = $10, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SceneRow>(&query)
            .bind(scene.id)
            .bind(&scene.title)
            .bind(&scene.details)
            .bind(scene.date.as_ref().map(|d| d.date.clone()))
            .bind(scene.date.as_ref().map(|d| d.accuracy.as_str()))
            .bind(scene.studio_id)
            .bind(scene.duration)
            .bind(&scene.director)
            .bind(&scene.code)
            .bind(scene.deleted)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn relations(conn: &mut PgConnection, id: DbId) -> Result<SceneRelations, sqlx::Error> {
        let performers: Vec<AppearanceRow> = sqlx::query_as(
            "SELECT performer_id, alias FROM scene_performers WHERE scene_id = $1 ORDER BY performer_id",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(SceneRelations {
            urls: lists::load_urls(conn, "scene_urls", "scene_id", id).await?,
            tags: lists::load_ids(conn, TAGS, id).await?,
            performers: performers.into_iter().map(PerformerAppearance::from).collect(),
            images: lists::load_ids(conn, IMAGES, id).await?,
        })
    }

    pub async fn save_relations(
        conn: &mut PgConnection,
        id: DbId,
        relations: &SceneRelations,
    ) -> Result<(), sqlx::Error> {
        lists::replace_urls(conn, "scene_urls", "scene_id", id, &relations.urls).await?;
        lists::replace_ids(conn, TAGS, id, &relations.tags).await?;
        lists::replace_ids(conn, IMAGES, id, &relations.images).await?;

        lists::clear(conn, "scene_performers", "scene_id", id).await?;
        if relations.performers.is_empty() {
            return Ok(());
        }
        let (ids, aliases): (Vec<DbId>, Vec<Option<String>>) = relations
            .performers
            .iter()
            .map(|p| (p.performer_id, p.alias.clone()))
            .unzip();
        sqlx::query(
            "INSERT INTO scene_performers (scene_id, performer_id, alias)
             SELECT $1, t.performer_id, t.alias
             FROM UNNEST($2::BIGINT[], $3::TEXT[]) AS t(performer_id, alias)
             ON CONFLICT (scene_id, performer_id) DO UPDATE SET alias = EXCLUDED.alias",
        )
        .bind(id)
        .bind(ids)
        .bind(aliases)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
