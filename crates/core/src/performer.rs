//! Performers: entity model, diff payload and translator.
//!
//! Performers carry the richest field set in the catalog and two extra
//! edit flags that control how scene credits keep their old names:
//!
//! - `set_modify_aliases`: on rename, credits without an explicit alias
//!   are pinned to the previous name.
//! - `set_merge_aliases`: on merge, credits moved from a source performer
//!   are pinned to the source's name.

use serde::{Deserialize, Serialize};

use crate::attributes::{BreastType, Ethnicity, EyeColor, Gender, HairColor};
use crate::diff::{
    apply_list_delta, apply_value, diff_enum, diff_list, diff_string, diff_value, FieldInput,
};
use crate::error::CoreError;
use crate::fuzzy_date::FuzzyDate;
use crate::relations::{BodyModification, Url};
use crate::tag::normalize_names;
use crate::types::{DbId, Timestamp};
use crate::validation::{
    check_field, reject_clear, require_non_blank, validate_body_modifications, validate_urls,
    validate_year_range,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performer {
    pub id: DbId,
    pub name: String,
    pub disambiguation: Option<String>,
    pub gender: Option<Gender>,
    pub birthdate: Option<FuzzyDate>,
    pub ethnicity: Option<Ethnicity>,
    /// ISO 3166-1 alpha-2 country code.
    pub country: Option<String>,
    pub eye_color: Option<EyeColor>,
    pub hair_color: Option<HairColor>,
    /// Height in centimetres.
    pub height: Option<i32>,
    pub breast_type: Option<BreastType>,
    pub career_start_year: Option<i32>,
    pub career_end_year: Option<i32>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerRelations {
    pub aliases: Vec<String>,
    pub urls: Vec<Url>,
    pub images: Vec<DbId>,
    pub tattoos: Vec<BodyModification>,
    pub piercings: Vec<BodyModification>,
}

impl PerformerRelations {
    pub fn apply(&mut self, edit: &PerformerEdit) {
        apply_list_delta(&mut self.aliases, &edit.added_aliases, &edit.removed_aliases);
        apply_list_delta(&mut self.urls, &edit.added_urls, &edit.removed_urls);
        apply_list_delta(&mut self.images, &edit.added_images, &edit.removed_images);
        apply_list_delta(&mut self.tattoos, &edit.added_tattoos, &edit.removed_tattoos);
        apply_list_delta(&mut self.piercings, &edit.added_piercings, &edit.removed_piercings);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<FuzzyDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<Ethnicity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<EyeColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<HairColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breast_type: Option<BreastType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_start_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_end_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_urls: Vec<Url>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_urls: Vec<Url>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_images: Vec<DbId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_images: Vec<DbId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_tattoos: Vec<BodyModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_tattoos: Vec<BodyModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_piercings: Vec<BodyModification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_piercings: Vec<BodyModification>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerEditData {
    #[serde(default)]
    pub new: PerformerEdit,
    #[serde(default)]
    pub old: PerformerEdit,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<DbId>,
    #[serde(default)]
    pub set_modify_aliases: bool,
    #[serde(default)]
    pub set_merge_aliases: bool,
}

impl PerformerEditData {
    pub fn has_changes(&self) -> bool {
        self.new != PerformerEdit::default() || self.old != PerformerEdit::default()
    }

    /// The edit renames the performer without pinning existing credits to
    /// the old name.
    pub fn is_unaliased_rename(&self) -> bool {
        let Some(new_name) = &self.new.name else {
            return false;
        };
        let renamed = self
            .old
            .name
            .as_deref()
            .map_or(true, |old| old.trim() != new_name.trim());
        renamed && !self.set_modify_aliases
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformerEditDetails {
    pub name: FieldInput<String>,
    pub disambiguation: FieldInput<String>,
    pub gender: FieldInput<Gender>,
    pub birthdate: FieldInput<FuzzyDate>,
    pub ethnicity: FieldInput<Ethnicity>,
    pub country: FieldInput<String>,
    pub eye_color: FieldInput<EyeColor>,
    pub hair_color: FieldInput<HairColor>,
    pub height: FieldInput<i32>,
    pub breast_type: FieldInput<BreastType>,
    pub career_start_year: FieldInput<i32>,
    pub career_end_year: FieldInput<i32>,
    pub aliases: Option<Vec<String>>,
    pub urls: Option<Vec<Url>>,
    pub images: Option<Vec<DbId>>,
    pub tattoos: Option<Vec<BodyModification>>,
    pub piercings: Option<Vec<BodyModification>>,
    pub set_modify_aliases: bool,
    pub set_merge_aliases: bool,
}

impl PerformerEditDetails {
    pub fn validate(&self) -> Result<(), CoreError> {
        reject_clear("Performer name", &self.name)?;
        if let Some(Some(birthdate)) = &self.birthdate {
            birthdate.validate()?;
        }
        if let Some(Some(height)) = self.height {
            if !(50..=300).contains(&height) {
                return Err(CoreError::Validation(format!(
                    "Height {height}cm is out of range"
                )));
            }
        }
        if let Some(Some(country)) = &self.country {
            let country = country.trim();
            if country.len() != 2 || !country.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(CoreError::Validation(format!(
                    "Country '{country}' must be a two-letter ISO code"
                )));
            }
        }
        validate_year_range(
            self.career_start_year.flatten(),
            self.career_end_year.flatten(),
        )?;
        if let Some(urls) = &self.urls {
            validate_urls(urls)?;
        }
        if let Some(tattoos) = &self.tattoos {
            validate_body_modifications("Tattoo", tattoos)?;
        }
        if let Some(piercings) = &self.piercings {
            validate_body_modifications("Piercing", piercings)?;
        }
        Ok(())
    }

    pub fn validate_create(&self) -> Result<(), CoreError> {
        self.validate()?;
        require_non_blank("Performer name", self.name.as_ref().and_then(|n| n.as_deref()))
    }

    pub fn create_data(&self) -> PerformerEditData {
        self.diff(&Performer::default(), &PerformerRelations::default())
    }

    pub fn diff(&self, current: &Performer, relations: &PerformerRelations) -> PerformerEditData {
        let mut data = PerformerEditData {
            set_modify_aliases: self.set_modify_aliases,
            set_merge_aliases: self.set_merge_aliases,
            ..Default::default()
        };
        let (old, new) = (&mut data.old, &mut data.new);
        (old.name, new.name) = diff_string(Some(&current.name), &self.name);
        (old.disambiguation, new.disambiguation) =
            diff_string(current.disambiguation.as_deref(), &self.disambiguation);
        (old.gender, new.gender) = diff_enum(current.gender, &self.gender);
        (old.birthdate, new.birthdate) = diff_value(current.birthdate.as_ref(), &self.birthdate);
        (old.ethnicity, new.ethnicity) = diff_enum(current.ethnicity, &self.ethnicity);
        (old.country, new.country) = diff_string(current.country.as_deref(), &self.country);
        (old.eye_color, new.eye_color) = diff_enum(current.eye_color, &self.eye_color);
        (old.hair_color, new.hair_color) = diff_enum(current.hair_color, &self.hair_color);
        (old.height, new.height) = diff_value(current.height.as_ref(), &self.height);
        (old.breast_type, new.breast_type) = diff_enum(current.breast_type, &self.breast_type);
        (old.career_start_year, new.career_start_year) =
            diff_value(current.career_start_year.as_ref(), &self.career_start_year);
        (old.career_end_year, new.career_end_year) =
            diff_value(current.career_end_year.as_ref(), &self.career_end_year);

        let aliases = self.aliases.as_ref().map(|list| normalize_names(list));
        (new.added_aliases, new.removed_aliases) = diff_list(&aliases, &relations.aliases);
        (new.added_urls, new.removed_urls) = diff_list(&self.urls, &relations.urls);
        (new.added_images, new.removed_images) = diff_list(&self.images, &relations.images);
        (new.added_tattoos, new.removed_tattoos) = diff_list(&self.tattoos, &relations.tattoos);
        (new.added_piercings, new.removed_piercings) =
            diff_list(&self.piercings, &relations.piercings);
        data
    }
}

impl Performer {
    pub fn validate_modify(&self, old: &PerformerEdit) -> Result<(), CoreError> {
        check_field("name", old.name.as_ref(), Some(&self.name))?;
        check_field("disambiguation", old.disambiguation.as_ref(), self.disambiguation.as_ref())?;
        check_field("gender", old.gender.as_ref(), self.gender.as_ref())?;
        check_field("birthdate", old.birthdate.as_ref(), self.birthdate.as_ref())?;
        check_field("ethnicity", old.ethnicity.as_ref(), self.ethnicity.as_ref())?;
        check_field("country", old.country.as_ref(), self.country.as_ref())?;
        check_field("eye color", old.eye_color.as_ref(), self.eye_color.as_ref())?;
        check_field("hair color", old.hair_color.as_ref(), self.hair_color.as_ref())?;
        check_field("height", old.height.as_ref(), self.height.as_ref())?;
        check_field("breast type", old.breast_type.as_ref(), self.breast_type.as_ref())?;
        check_field(
            "career start year",
            old.career_start_year.as_ref(),
            self.career_start_year.as_ref(),
        )?;
        check_field(
            "career end year",
            old.career_end_year.as_ref(),
            self.career_end_year.as_ref(),
        )?;
        Ok(())
    }

    pub fn apply_edit(&mut self, data: &PerformerEditData) {
        let (old, new) = (&data.old, &data.new);
        if let Some(name) = &new.name {
            self.name = name.clone();
        }
        apply_value(&mut self.disambiguation, &old.disambiguation, &new.disambiguation);
        apply_value(&mut self.gender, &old.gender, &new.gender);
        apply_value(&mut self.birthdate, &old.birthdate, &new.birthdate);
        apply_value(&mut self.ethnicity, &old.ethnicity, &new.ethnicity);
        apply_value(&mut self.country, &old.country, &new.country);
        apply_value(&mut self.eye_color, &old.eye_color, &new.eye_color);
        apply_value(&mut self.hair_color, &old.hair_color, &new.hair_color);
        apply_value(&mut self.height, &old.height, &new.height);
        apply_value(&mut self.breast_type, &old.breast_type, &new.breast_type);
        apply_value(&mut self.career_start_year, &old.career_start_year, &new.career_start_year);
        apply_value(&mut self.career_end_year, &old.career_end_year, &new.career_end_year);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::fuzzy_date::DateAccuracy;

    fn jane() -> Performer {
        Performer {
            id: 3,
            name: "Jane".to_string(),
            gender: Some(Gender::Female),
            height: Some(170),
            ..Default::default()
        }
    }

    #[test]
    fn enum_change_is_diffed_by_canonical_string() {
        let details = PerformerEditDetails {
            gender: Some(Some(Gender::Female)),
            eye_color: Some(Some(EyeColor::Green)),
            ..Default::default()
        };
        let data = details.diff(&jane(), &PerformerRelations::default());
        assert_eq!(data.new.gender, None);
        assert_eq!(data.new.eye_color, Some(EyeColor::Green));
        assert_eq!(data.old.eye_color, None);
    }

    #[test]
    fn rename_without_alias_flag_is_unaliased() {
        let details = PerformerEditDetails {
            name: Some(Some("Janet".to_string())),
            ..Default::default()
        };
        let data = details.diff(&jane(), &PerformerRelations::default());
        assert!(data.is_unaliased_rename());

        let details = PerformerEditDetails {
            set_modify_aliases: true,
            ..details
        };
        assert!(!details.diff(&jane(), &PerformerRelations::default()).is_unaliased_rename());
    }

    #[test]
    fn tattoo_with_new_description_replaces_old() {
        let relations = PerformerRelations {
            tattoos: vec![BodyModification {
                location: "Left arm".to_string(),
                description: Some("Rose".to_string()),
            }],
            ..Default::default()
        };
        let replacement = BodyModification {
            location: "Left arm".to_string(),
            description: Some("Lily".to_string()),
        };
        let details = PerformerEditDetails {
            tattoos: Some(vec![replacement.clone()]),
            ..Default::default()
        };
        let data = details.diff(&jane(), &relations);
        let mut applied = relations.clone();
        applied.apply(&data.new);
        assert_eq!(applied.tattoos, vec![replacement]);
    }

    #[test]
    fn stale_height_fails_precondition_with_message() {
        let mut performer = jane();
        let data = PerformerEditDetails {
            height: Some(Some(172)),
            ..Default::default()
        }
        .diff(&performer, &PerformerRelations::default());
        performer.height = Some(168);
        let err = performer.validate_modify(&data.old).unwrap_err();
        assert_matches!(err, CoreError::PrerequisiteFailed(f) => {
            assert_eq!(f.to_string(), "Expected height to be **170**, but was **168**.");
        });
    }

    #[test]
    fn validate_rejects_bad_country_code() {
        let details = PerformerEditDetails {
            country: Some(Some("Germany".to_string())),
            ..Default::default()
        };
        assert_matches!(details.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn validate_rejects_malformed_birthdate() {
        let details = PerformerEditDetails {
            birthdate: Some(Some(FuzzyDate {
                date: "12/04/1990".to_string(),
                accuracy: DateAccuracy::Day,
            })),
            ..Default::default()
        };
        assert_matches!(details.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn validate_rejects_birthdate_accuracy_mismatch() {
        let details = PerformerEditDetails {
            birthdate: Some(Some(FuzzyDate {
                date: "1990".to_string(),
                accuracy: DateAccuracy::Day,
            })),
            ..Default::default()
        };
        assert_matches!(details.validate(), Err(CoreError::Validation(_)));
    }
}
