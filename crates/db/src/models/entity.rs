//! Rows from the four catalog entity tables and their list tables.

use catalog_core::performer::Performer;
use catalog_core::relations::{BodyModification, PerformerAppearance, Url};
use catalog_core::scene::Scene;
use catalog_core::store::StoreError;
use catalog_core::studio::Studio;
use catalog_core::tag::Tag;
use catalog_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::{fuzzy_date_from_columns, parse_optional_column};

/// A row from the `tags` table.
#[derive(Debug, Clone, FromRow)]
pub struct TagRow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            description: row.description,
            category_id: row.category_id,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `performers` table.
#[derive(Debug, Clone, FromRow)]
pub struct PerformerRow {
    pub id: DbId,
    pub name: String,
    pub disambiguation: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    pub birthdate_accuracy: Option<String>,
    pub ethnicity: Option<String>,
    pub country: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<i32>,
    pub breast_type: Option<String>,
    pub career_start_year: Option<i32>,
    pub career_end_year: Option<i32>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<PerformerRow> for Performer {
    type Error = StoreError;

    fn try_from(row: PerformerRow) -> Result<Self, Self::Error> {
        Ok(Performer {
            id: row.id,
            name: row.name,
            disambiguation: row.disambiguation,
            gender: parse_optional_column("performers.gender", row.gender.as_deref())?,
            birthdate: fuzzy_date_from_columns(
                "performers.birthdate_accuracy",
                row.birthdate,
                row.birthdate_accuracy.as_deref(),
            )?,
            ethnicity: parse_optional_column("performers.ethnicity", row.ethnicity.as_deref())?,
            country: row.country,
            eye_color: parse_optional_column("performers.eye_color", row.eye_color.as_deref())?,
            hair_color: parse_optional_column("performers.hair_color", row.hair_color.as_deref())?,
            height: row.height,
            breast_type: parse_optional_column(
                "performers.breast_type",
                row.breast_type.as_deref(),
            )?,
            career_start_year: row.career_start_year,
            career_end_year: row.career_end_year,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `studios` table.
#[derive(Debug, Clone, FromRow)]
pub struct StudioRow {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<StudioRow> for Studio {
    fn from(row: StudioRow) -> Self {
        Studio {
            id: row.id,
            name: row.name,
            parent_id: row.parent_id,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from the `scenes` table.
#[derive(Debug, Clone, FromRow)]
pub struct SceneRow {
    pub id: DbId,
    pub title: Option<String>,
    pub details: Option<String>,
    pub date: Option<String>,
    pub date_accuracy: Option<String>,
    pub studio_id: Option<DbId>,
    pub duration: Option<i32>,
    pub director: Option<String>,
    pub code: Option<String>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<SceneRow> for Scene {
    type Error = StoreError;

    fn try_from(row: SceneRow) -> Result<Self, Self::Error> {
        Ok(Scene {
            id: row.id,
            title: row.title,
            details: row.details,
            date: fuzzy_date_from_columns(
                "scenes.date_accuracy",
                row.date,
                row.date_accuracy.as_deref(),
            )?,
            studio_id: row.studio_id,
            duration: row.duration,
            director: row.director,
            code: row.code,
            deleted: row.deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from any `*_urls` table.
#[derive(Debug, Clone, FromRow)]
pub struct UrlRow {
    pub url: String,
    pub site: String,
}

impl From<UrlRow> for Url {
    fn from(row: UrlRow) -> Self {
        Url {
            url: row.url,
            site: row.site,
        }
    }
}

/// A row from `performer_tattoos` or `performer_piercings`.
#[derive(Debug, Clone, FromRow)]
pub struct BodyModificationRow {
    pub location: String,
    pub description: Option<String>,
}

impl From<BodyModificationRow> for BodyModification {
    fn from(row: BodyModificationRow) -> Self {
        BodyModification {
            location: row.location,
            description: row.description,
        }
    }
}

/// A row from `scene_performers`.
#[derive(Debug, Clone, FromRow)]
pub struct AppearanceRow {
    pub performer_id: DbId,
    pub alias: Option<String>,
}

impl From<AppearanceRow> for PerformerAppearance {
    fn from(row: AppearanceRow) -> Self {
        PerformerAppearance {
            performer_id: row.performer_id,
            alias: row.alias,
        }
    }
}
