//! Repository for the `performers` table, its list tables, and the
//! performer side of `scene_performers`.

use catalog_core::performer::{Performer, PerformerRelations};
use catalog_core::types::DbId;
use sqlx::PgConnection;

use super::lists::{self, ListTable};
use crate::models::entity::PerformerRow;

/// Column list for performers queries.
const COLUMNS: &str = "id, name, disambiguation, gender, birthdate, birthdate_accuracy, \
    ethnicity, country, eye_color, hair_color, height, breast_type, career_start_year, \
    career_end_year, deleted, created_at, updated_at";

const ALIASES: ListTable = ("performer_aliases", "performer_id", "alias");
const IMAGES: ListTable = ("performer_images", "performer_id", "image_id");

pub struct PerformerRepo;

impl PerformerRepo {
    pub async fn find_by_id(conn: &mut PgConnection, id: DbId) -> Result<Option<PerformerRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM performers WHERE id = $1");
        sqlx::query_as::<_, PerformerRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Find a performer and lock its row until the surrounding transaction ends.
    pub async fn find_by_id_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<PerformerRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM performers WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, PerformerRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn create(conn: &mut PgConnection, p: &Performer) -> Result<PerformerRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO performers
                (name, disambiguation, gender, birthdate, birthdate_accuracy, ethnicity, country,
                 eye_color, hair_color, height, breast_type, career_start_year, career_end_year)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PerformerRow>(&query)
            .bind(&p.name)
            .bind(&p.disambiguation)
            .bind(p.gender.map(|v| v.as_str()))
            .bind(p.birthdate.as_ref().map(|d| d.date.clone()))
            .bind(p.birthdate.as_ref().map(|d| d.accuracy.as_str()))
            .bind(p.ethnicity.map(|v| v.as_str()))
            .bind(&p.country)
            .bind(p.eye_color.map(|v| v.as_str()))
            .bind(p.hair_color.map(|v| v.as_str()))
            .bind(p.height)
            .bind(p.breast_type.map(|v| v.as_str()))
            .bind(p.career_start_year)
            .bind(p.career_end_year)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn update(conn: &mut PgConnection, p: &Performer) -> Result<Option<PerformerRow>, sqlx::Error> {
        let query = format!(
            "UPDATE performers SET
                name = $2, disambiguation = $3, gender = $4, birthdate = $5,
                birthdate_accuracy = $6, ethnicity = $7, country = $8, eye_color = $9,
                hair_color = $10, height = $11, breast_type = $12, career_start_year = $13,
                career_end_year = $14, deleted = $15, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PerformerRow>(&query)
            .bind(p.id)
            .bind(&p.name)
            .bind(&p.disambiguation)
            .bind(p.gender.map(|v| v.as_str()))
            .bind(p.birthdate.as_ref().map(|d| d.date.clone()))
            .bind(p.birthdate.as_ref().map(|d| d.accuracy.as_str()))
            .bind(p.ethnicity.map(|v| v.as_str()))
            .bind(&p.country)
            .bind(p.eye_color.map(|v| v.as_str()))
            .bind(p.hair_color.map(|v| v.as_str()))
            .bind(p.height)
            .bind(p.breast_type.map(|v| v.as_str()))
            .bind(p.career_start_year)
            .bind(p.career_end_year)
            .bind(p.deleted)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn relations(conn: &mut PgConnection, id: DbId) -> Result<PerformerRelations, sqlx::Error> {
        Ok(PerformerRelations {
            aliases: lists::load_strings(conn, ALIASES, id).await?,
            urls: lists::load_urls(conn, "performer_urls", "performer_id", id).await?,
            images: lists::load_ids(conn, IMAGES, id).await?,
            tattoos: lists::load_body_modifications(conn, "performer_tattoos", id).await?,
            piercings: lists::load_body_modifications(conn, "performer_piercings", id).await?,
        })
    }

    pub async fn save_relations(
        conn: &mut PgConnection,
        id: DbId,
        relations: &PerformerRelations,
    ) -> Result<(), sqlx::Error> {
        lists::replace_strings(conn, ALIASES, id, &relations.aliases).await?;
        lists::replace_urls(conn, "performer_urls", "performer_id", id, &relations.urls).await?;
        lists::replace_ids(conn, IMAGES, id, &relations.images).await?;
        lists::replace_body_modifications(conn, "performer_tattoos", id, &relations.tattoos).await?;
        lists::replace_body_modifications(conn, "performer_piercings", id, &relations.piercings)
            .await
    }

    /// Move scene appearances from `source` to `target`.
    ///
    /// Scenes where `target` already appears keep the target's row and the
    /// source row is dropped. When `alias` is given it fills in moved rows
    /// that had no alias.
    pub async fn reassign_scene_performers(
        conn: &mut PgConnection,
        source: DbId,
        target: DbId,
        alias: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let moved = sqlx::query(
            "UPDATE scene_performers SET performer_id = $2, alias = COALESCE(alias, $3)
             WHERE performer_id = $1
               AND scene_id NOT IN (SELECT scene_id FROM scene_performers WHERE performer_id = $2)",
        )
        .bind(source)
        .bind(target)
        .bind(alias)
        .execute(&mut *conn)
        .await?;
        lists::clear(conn, "scene_performers", "performer_id", source).await?;
        Ok(moved.rows_affected())
    }

    pub async fn set_scene_alias(conn: &mut PgConnection, performer_id: DbId, alias: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scene_performers SET alias = $2 WHERE performer_id = $1 AND alias IS NULL",
        )
        .bind(performer_id)
        .bind(alias)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn clear_scene_alias(conn: &mut PgConnection, performer_id: DbId, alias: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE scene_performers SET alias = NULL WHERE performer_id = $1 AND alias = $2",
        )
        .bind(performer_id)
        .bind(alias)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_scene_performers(conn: &mut PgConnection, performer_id: DbId) -> Result<u64, sqlx::Error> {
        lists::clear(conn, "scene_performers", "performer_id", performer_id).await
    }
}
