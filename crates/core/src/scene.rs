//! Scenes: entity model, diff payload and translator.

use serde::{Deserialize, Serialize};

use crate::diff::{apply_list_delta, apply_value, diff_list, diff_string, diff_value, FieldInput};
use crate::error::CoreError;
use crate::fuzzy_date::FuzzyDate;
use crate::relations::{PerformerAppearance, Url};
use crate::types::{DbId, Timestamp};
use crate::validation::{check_field, require_non_blank, validate_urls};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: DbId,
    pub title: Option<String>,
    pub details: Option<String>,
    pub date: Option<FuzzyDate>,
    pub studio_id: Option<DbId>,
    /// Runtime in seconds.
    pub duration: Option<i32>,
    pub director: Option<String>,
    pub code: Option<String>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRelations {
    pub urls: Vec<Url>,
    pub tags: Vec<DbId>,
    pub performers: Vec<PerformerAppearance>,
    pub images: Vec<DbId>,
}

impl SceneRelations {
    pub fn apply(&mut self, edit: &SceneEdit) {
        apply_list_delta(&mut self.urls, &edit.added_urls, &edit.removed_urls);
        apply_list_delta(&mut self.tags, &edit.added_tags, &edit.removed_tags);
        apply_list_delta(&mut self.images, &edit.added_images, &edit.removed_images);
        apply_list_delta(&mut self.performers, &edit.added_performers, &edit.removed_performers);
        // One appearance per performer: a later credit replaces an earlier one.
        let mut seen = Vec::new();
        let mut deduped = Vec::with_capacity(self.performers.len());
        for appearance in self.performers.iter().rev() {
            if !seen.contains(&appearance.performer_id) {
                seen.push(appearance.performer_id);
                deduped.push(appearance.clone());
            }
        }
        deduped.reverse();
        self.performers = deduped;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<FuzzyDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio_id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_urls: Vec<Url>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_urls: Vec<Url>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_tags: Vec<DbId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_tags: Vec<DbId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_performers: Vec<PerformerAppearance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_performers: Vec<PerformerAppearance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_images: Vec<DbId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_images: Vec<DbId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneEditData {
    #[serde(default)]
    pub new: SceneEdit,
    #[serde(default)]
    pub old: SceneEdit,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<DbId>,
}

impl SceneEditData {
    pub fn has_changes(&self) -> bool {
        self.new != SceneEdit::default() || self.old != SceneEdit::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneEditDetails {
    pub title: FieldInput<String>,
    pub details: FieldInput<String>,
    pub date: FieldInput<FuzzyDate>,
    pub studio_id: FieldInput<DbId>,
    pub duration: FieldInput<i32>,
    pub director: FieldInput<String>,
    pub code: FieldInput<String>,
    pub urls: Option<Vec<Url>>,
    pub tags: Option<Vec<DbId>>,
    pub performers: Option<Vec<PerformerAppearance>>,
    pub images: Option<Vec<DbId>>,
}

impl SceneEditDetails {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(Some(date)) = &self.date {
            date.validate()?;
        }
        if let Some(Some(duration)) = self.duration {
            if duration <= 0 {
                return Err(CoreError::Validation(format!(
                    "Scene duration must be positive, got {duration}"
                )));
            }
        }
        if let Some(urls) = &self.urls {
            validate_urls(urls)?;
        }
        if let Some(performers) = &self.performers {
            let mut ids: Vec<DbId> = performers.iter().map(|p| p.performer_id).collect();
            ids.sort_unstable();
            ids.dedup();
            if ids.len() != performers.len() {
                return Err(CoreError::Validation(
                    "A performer may appear only once per scene".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn validate_create(&self) -> Result<(), CoreError> {
        self.validate()?;
        require_non_blank("Scene title", self.title.as_ref().and_then(|t| t.as_deref()))
    }

    pub fn create_data(&self) -> SceneEditData {
        self.diff(&Scene::default(), &SceneRelations::default())
    }

    pub fn diff(&self, current: &Scene, relations: &SceneRelations) -> SceneEditData {
        let mut data = SceneEditData::default();
        let (old, new) = (&mut data.old, &mut data.new);
        (old.title, new.title) = diff_string(current.title.as_deref(), &self.title);
        (old.details, new.details) = diff_string(current.details.as_deref(), &self.details);
        (old.date, new.date) = diff_value(current.date.as_ref(), &self.date);
        (old.studio_id, new.studio_id) = diff_value(current.studio_id.as_ref(), &self.studio_id);
        (old.duration, new.duration) = diff_value(current.duration.as_ref(), &self.duration);
        (old.director, new.director) = diff_string(current.director.as_deref(), &self.director);
        (old.code, new.code) = diff_string(current.code.as_deref(), &self.code);

        (new.added_urls, new.removed_urls) = diff_list(&self.urls, &relations.urls);
        (new.added_tags, new.removed_tags) = diff_list(&self.tags, &relations.tags);
        (new.added_performers, new.removed_performers) =
            diff_list(&self.performers, &relations.performers);
        (new.added_images, new.removed_images) = diff_list(&self.images, &relations.images);
        data
    }
}

impl Scene {
    pub fn validate_modify(&self, old: &SceneEdit) -> Result<(), CoreError> {
        check_field("title", old.title.as_ref(), self.title.as_ref())?;
        check_field("details", old.details.as_ref(), self.details.as_ref())?;
        check_field("date", old.date.as_ref(), self.date.as_ref())?;
        check_field("studio", old.studio_id.as_ref(), self.studio_id.as_ref())?;
        check_field("duration", old.duration.as_ref(), self.duration.as_ref())?;
        check_field("director", old.director.as_ref(), self.director.as_ref())?;
        check_field("code", old.code.as_ref(), self.code.as_ref())?;
        Ok(())
    }

    pub fn apply_edit(&mut self, data: &SceneEditData) {
        let (old, new) = (&data.old, &data.new);
        apply_value(&mut self.title, &old.title, &new.title);
        apply_value(&mut self.details, &old.details, &new.details);
        apply_value(&mut self.date, &old.date, &new.date);
        apply_value(&mut self.studio_id, &old.studio_id, &new.studio_id);
        apply_value(&mut self.duration, &old.duration, &new.duration);
        apply_value(&mut self.director, &old.director, &new.director);
        apply_value(&mut self.code, &old.code, &new.code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy_date::DateAccuracy;

    #[test]
    fn date_and_accuracy_diff_as_one_unit() {
        let scene = Scene {
            date: Some(FuzzyDate::parse("2020").unwrap()),
            ..Default::default()
        };
        let details = SceneEditDetails {
            date: Some(Some(FuzzyDate::parse("2020-05").unwrap())),
            ..Default::default()
        };
        let data = details.diff(&scene, &SceneRelations::default());
        assert_eq!(data.old.date, Some(FuzzyDate::parse("2020").unwrap()));
        assert_eq!(data.new.date, Some(FuzzyDate::parse("2020-05").unwrap()));
    }

    #[test]
    fn changed_credit_is_removed_and_readded() {
        let relations = SceneRelations {
            performers: vec![PerformerAppearance::new(7, None)],
            ..Default::default()
        };
        let details = SceneEditDetails {
            performers: Some(vec![PerformerAppearance::new(7, Some("Jo"))]),
            ..Default::default()
        };
        let data = details.diff(&Scene::default(), &relations);
        assert_eq!(data.new.added_performers, vec![PerformerAppearance::new(7, Some("Jo"))]);
        assert_eq!(data.new.removed_performers, vec![PerformerAppearance::new(7, None)]);

        let mut applied = relations.clone();
        applied.apply(&data.new);
        assert_eq!(applied.performers, vec![PerformerAppearance::new(7, Some("Jo"))]);
    }

    #[test]
    fn duplicate_performer_is_rejected() {
        let details = SceneEditDetails {
            performers: Some(vec![
                PerformerAppearance::new(7, None),
                PerformerAppearance::new(7, Some("Jo")),
            ]),
            ..Default::default()
        };
        assert!(details.validate().is_err());
    }

    #[test]
    fn create_requires_title() {
        assert!(SceneEditDetails::default().validate_create().is_err());
    }

    #[test]
    fn validate_checks_date_string_and_accuracy() {
        let malformed = SceneEditDetails {
            date: Some(Some(FuzzyDate {
                date: "2020-5".to_string(),
                accuracy: DateAccuracy::Month,
            })),
            ..Default::default()
        };
        assert!(malformed.validate().is_err());

        let mismatched = SceneEditDetails {
            date: Some(Some(FuzzyDate {
                date: "2020".to_string(),
                accuracy: DateAccuracy::Day,
            })),
            ..Default::default()
        };
        assert!(mismatched.validate().is_err());

        let cleared = SceneEditDetails {
            date: Some(None),
            ..Default::default()
        };
        assert!(cleared.validate().is_ok());
    }
}
