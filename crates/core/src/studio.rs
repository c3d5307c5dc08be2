//! Studios: entity model, diff payload and translator.

use serde::{Deserialize, Serialize};

use crate::diff::{apply_list_delta, apply_value, diff_list, diff_string, diff_value, FieldInput};
use crate::error::CoreError;
use crate::relations::Url;
use crate::tag::normalize_names;
use crate::types::{DbId, Timestamp};
use crate::validation::{check_field, reject_clear, require_non_blank, validate_urls};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Studio {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioRelations {
    pub aliases: Vec<String>,
    pub urls: Vec<Url>,
    pub images: Vec<DbId>,
}

impl StudioRelations {
    pub fn apply(&mut self, edit: &StudioEdit) {
        apply_list_delta(&mut self.aliases, &edit.added_aliases, &edit.removed_aliases);
        apply_list_delta(&mut self.urls, &edit.added_urls, &edit.removed_urls);
        apply_list_delta(&mut self.images, &edit.added_images, &edit.removed_images);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<DbId>,
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
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudioEditData {
    #[serde(default)]
    pub new: StudioEdit,
    #[serde(default)]
    pub old: StudioEdit,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<DbId>,
}

impl StudioEditData {
    pub fn has_changes(&self) -> bool {
        self.new != StudioEdit::default() || self.old != StudioEdit::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudioEditDetails {
    pub name: FieldInput<String>,
    pub parent_id: FieldInput<DbId>,
    pub aliases: Option<Vec<String>>,
    pub urls: Option<Vec<Url>>,
    pub images: Option<Vec<DbId>>,
}

impl StudioEditDetails {
    pub fn validate(&self) -> Result<(), CoreError> {
        reject_clear("Studio name", &self.name)?;
        if let Some(urls) = &self.urls {
            validate_urls(urls)?;
        }
        Ok(())
    }

    pub fn validate_create(&self) -> Result<(), CoreError> {
        self.validate()?;
        require_non_blank("Studio name", self.name.as_ref().and_then(|n| n.as_deref()))
    }

    pub fn create_data(&self) -> StudioEditData {
        self.diff(&Studio::default(), &StudioRelations::default())
    }

    pub fn diff(&self, current: &Studio, relations: &StudioRelations) -> StudioEditData {
        let mut data = StudioEditData::default();
        (data.old.name, data.new.name) = diff_string(Some(&current.name), &self.name);
        (data.old.parent_id, data.new.parent_id) =
            diff_value(current.parent_id.as_ref(), &self.parent_id);

        let aliases = self.aliases.as_ref().map(|list| normalize_names(list));
        (data.new.added_aliases, data.new.removed_aliases) = diff_list(&aliases, &relations.aliases);
        (data.new.added_urls, data.new.removed_urls) = diff_list(&self.urls, &relations.urls);
        (data.new.added_images, data.new.removed_images) = diff_list(&self.images, &relations.images);
        data
    }
}

impl Studio {
    pub fn validate_modify(&self, old: &StudioEdit) -> Result<(), CoreError> {
        check_field("name", old.name.as_ref(), Some(&self.name))?;
        check_field("parent studio", old.parent_id.as_ref(), self.parent_id.as_ref())?;
        Ok(())
    }

    pub fn apply_edit(&mut self, data: &StudioEditData) {
        if let Some(name) = &data.new.name {
            self.name = name.clone();
        }
        apply_value(&mut self.parent_id, &data.old.parent_id, &data.new.parent_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_changes_land_in_new_lists() {
        let relations = StudioRelations {
            urls: vec![Url::new("https://old.example", "HOME")],
            ..Default::default()
        };
        let details = StudioEditDetails {
            urls: Some(vec![Url::new("https://new.example", "HOME")]),
            ..Default::default()
        };
        let data = details.diff(&Studio::default(), &relations);
        assert_eq!(data.new.added_urls, vec![Url::new("https://new.example", "HOME")]);
        assert_eq!(data.new.removed_urls, vec![Url::new("https://old.example", "HOME")]);
    }

    #[test]
    fn clearing_parent_applies() {
        let mut studio = Studio {
            id: 2,
            name: "Sub".to_string(),
            parent_id: Some(1),
            ..Default::default()
        };
        let data = StudioEditDetails {
            parent_id: Some(None),
            ..Default::default()
        }
        .diff(&studio, &StudioRelations::default());
        studio.validate_modify(&data.old).unwrap();
        studio.apply_edit(&data);
        assert_eq!(studio.parent_id, None);
    }
}
