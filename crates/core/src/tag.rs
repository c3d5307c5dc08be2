//! Tags: entity model, diff payload and translator.

use serde::{Deserialize, Serialize};

use crate::diff::{apply_list_delta, apply_value, diff_list, diff_string, diff_value, FieldInput};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};
use crate::validation::{check_field, reject_clear, require_non_blank};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<DbId>,
    pub deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// List relationships owned by a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRelations {
    pub aliases: Vec<String>,
}

impl TagRelations {
    pub fn apply(&mut self, edit: &TagEdit) {
        apply_list_delta(&mut self.aliases, &edit.added_aliases, &edit.removed_aliases);
    }
}

/// Sparse tag snapshot; only changed fields are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<DbId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_aliases: Vec<String>,
}

/// Stored payload of a tag edit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagEditData {
    #[serde(default)]
    pub new: TagEdit,
    #[serde(default)]
    pub old: TagEdit,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_sources: Vec<DbId>,
}

impl TagEditData {
    pub fn has_changes(&self) -> bool {
        self.new != TagEdit::default() || self.old != TagEdit::default()
    }
}

/// Submitted tag details. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagEditDetails {
    pub name: FieldInput<String>,
    pub description: FieldInput<String>,
    pub category_id: FieldInput<DbId>,
    pub aliases: Option<Vec<String>>,
}

impl TagEditDetails {
    pub fn validate(&self) -> Result<(), CoreError> {
        reject_clear("Tag name", &self.name)
    }

    pub fn validate_create(&self) -> Result<(), CoreError> {
        self.validate()?;
        require_non_blank("Tag name", self.name.as_ref().and_then(|n| n.as_deref()))
    }

    /// Payload for a Create: every provided field lands in `new`.
    pub fn create_data(&self) -> TagEditData {
        self.diff(&Tag::default(), &TagRelations::default())
    }

    /// Compare the details with the live tag.
    pub fn diff(&self, current: &Tag, relations: &TagRelations) -> TagEditData {
        let mut data = TagEditData::default();
        (data.old.name, data.new.name) = diff_string(Some(&current.name), &self.name);
        (data.old.description, data.new.description) =
            diff_string(current.description.as_deref(), &self.description);
        (data.old.category_id, data.new.category_id) =
            diff_value(current.category_id.as_ref(), &self.category_id);

        let aliases = self.aliases.as_ref().map(|list| normalize_names(list));
        (data.new.added_aliases, data.new.removed_aliases) = diff_list(&aliases, &relations.aliases);
        data
    }
}

impl Tag {
    /// Check every recorded `old` value against this live tag.
    pub fn validate_modify(&self, old: &TagEdit) -> Result<(), CoreError> {
        check_field("name", old.name.as_ref(), Some(&self.name))?;
        check_field("description", old.description.as_ref(), self.description.as_ref())?;
        check_field("category", old.category_id.as_ref(), self.category_id.as_ref())?;
        Ok(())
    }

    pub fn apply_edit(&mut self, data: &TagEditData) {
        if let Some(name) = &data.new.name {
            self.name = name.clone();
        }
        apply_value(&mut self.description, &data.old.description, &data.new.description);
        apply_value(&mut self.category_id, &data.old.category_id, &data.new.category_id);
    }
}

/// Trim names and drop blanks.
pub(crate) fn normalize_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn live_tag() -> Tag {
        Tag {
            id: 1,
            name: "Outdoor".to_string(),
            description: Some("Filmed outside".to_string()),
            ..Tag::default()
        }
    }

    #[test]
    fn create_requires_name() {
        let details = TagEditDetails::default();
        assert_matches!(details.validate_create(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn create_data_populates_only_new() {
        let details = TagEditDetails {
            name: Some(Some("Outdoor".to_string())),
            aliases: Some(vec!["Outside".to_string(), " ".to_string()]),
            ..Default::default()
        };
        let data = details.create_data();
        assert_eq!(data.new.name.as_deref(), Some("Outdoor"));
        assert_eq!(data.new.added_aliases, vec!["Outside".to_string()]);
        assert_eq!(data.old, TagEdit::default());
    }

    #[test]
    fn diff_records_changed_fields_only() {
        let details = TagEditDetails {
            name: Some(Some("Outdoor".to_string())),
            description: Some(None),
            ..Default::default()
        };
        let data = details.diff(&live_tag(), &TagRelations::default());
        assert_eq!(data.new.name, None);
        assert_eq!(data.old.name, None);
        assert_eq!(data.old.description.as_deref(), Some("Filmed outside"));
        assert_eq!(data.new.description, None);
        assert!(data.has_changes());
    }

    #[test]
    fn identical_details_have_no_changes() {
        let details = TagEditDetails {
            name: Some(Some("Outdoor".to_string())),
            aliases: Some(vec!["Outside".to_string()]),
            ..Default::default()
        };
        let relations = TagRelations {
            aliases: vec!["Outside".to_string()],
        };
        assert!(!details.diff(&live_tag(), &relations).has_changes());
    }

    #[test]
    fn apply_clears_old_only_fields() {
        let mut tag = live_tag();
        let data = TagEditData {
            old: TagEdit {
                description: Some("Filmed outside".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        tag.validate_modify(&data.old).unwrap();
        tag.apply_edit(&data);
        assert_eq!(tag.description, None);
        assert_eq!(tag.name, "Outdoor");
    }

    #[test]
    fn stale_old_name_fails_precondition() {
        let tag = live_tag();
        let old = TagEdit {
            name: Some("Indoor".to_string()),
            ..Default::default()
        };
        assert_matches!(tag.validate_modify(&old), Err(CoreError::PrerequisiteFailed(_)));
    }
}
