//! Edit submissions and the per-kind dispatch that turns them into a
//! stored diff payload.

use std::collections::BTreeSet;

use catalog_core::edit::{Operation, TargetType};
use catalog_core::error::CoreError;
use catalog_core::performer::PerformerEditDetails;
use catalog_core::scene::SceneEditDetails;
use catalog_core::store::CatalogTx;
use catalog_core::studio::StudioEditDetails;
use catalog_core::tag::TagEditDetails;
use catalog_core::types::DbId;
use serde::Serialize;

use crate::error::EngineResult;
use crate::{performer, scene, studio, tag};

/// Proposed field values, one variant per entity kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EditDetails {
    Tag(TagEditDetails),
    Performer(PerformerEditDetails),
    Studio(StudioEditDetails),
    Scene(SceneEditDetails),
}

impl EditDetails {
    pub fn target_type(&self) -> TargetType {
        match self {
            EditDetails::Tag(_) => TargetType::Tag,
            EditDetails::Performer(_) => TargetType::Performer,
            EditDetails::Studio(_) => TargetType::Studio,
            EditDetails::Scene(_) => TargetType::Scene,
        }
    }
}

/// Everything a user sends to open or amend an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSubmission {
    pub operation: Operation,
    /// The entity acted upon. Absent for Create.
    pub target_id: Option<DbId>,
    /// Entities absorbed by a Merge.
    pub merge_source_ids: Vec<DbId>,
    /// Optional note recorded as the edit's first comment.
    pub comment: Option<String>,
    pub details: EditDetails,
}

impl EditSubmission {
    pub fn new(operation: Operation, details: EditDetails) -> Self {
        Self {
            operation,
            target_id: None,
            merge_source_ids: Vec::new(),
            comment: None,
            details,
        }
    }

    pub fn with_target(mut self, target_id: DbId) -> Self {
        self.target_id = Some(target_id);
        self
    }

    pub fn with_merge_sources(mut self, sources: Vec<DbId>) -> Self {
        self.merge_source_ids = sources;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn target_type(&self) -> TargetType {
        self.details.target_type()
    }

    /// Check that the target and merge sources fit the operation.
    pub fn validate_shape(&self) -> Result<(), CoreError> {
        match self.operation {
            Operation::Create => {
                if self.target_id.is_some() {
                    return Err(CoreError::Validation(
                        "Create edits cannot name a target".to_string(),
                    ));
                }
            }
            Operation::Modify | Operation::Destroy | Operation::Merge => {
                required_target(self.target_id)?;
            }
        }

        if self.operation != Operation::Merge {
            if !self.merge_source_ids.is_empty() {
                return Err(CoreError::Validation(format!(
                    "{} edits cannot have merge sources",
                    self.operation
                )));
            }
            return Ok(());
        }

        if self.merge_source_ids.is_empty() {
            return Err(CoreError::Validation(
                "Merge edits need at least one source".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for source in &self.merge_source_ids {
            if Some(*source) == self.target_id {
                return Err(CoreError::Validation(format!(
                    "Merge source {source} is also the merge target"
                )));
            }
            if !seen.insert(*source) {
                return Err(CoreError::Validation(format!(
                    "Merge source {source} is listed twice"
                )));
            }
        }
        Ok(())
    }

    /// The comment text, if one was given and is not blank.
    pub(crate) fn comment_text(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

pub(crate) fn required_target(target_id: Option<DbId>) -> Result<DbId, CoreError> {
    target_id.ok_or_else(|| CoreError::Validation("A target id is required".to_string()))
}

pub(crate) fn ensure_changes(has_changes: bool) -> Result<(), CoreError> {
    if has_changes {
        Ok(())
    } else {
        Err(CoreError::Validation("Edit contains no changes".to_string()))
    }
}

pub(crate) fn encode<T: Serialize>(data: &T) -> Result<serde_json::Value, CoreError> {
    serde_json::to_value(data)
        .map_err(|e| CoreError::Internal(format!("Failed to encode edit data: {e}")))
}

/// Diff the submission against the live catalog and encode the payload.
pub(crate) async fn build_edit_data<T: CatalogTx>(
    tx: &mut T,
    submission: &EditSubmission,
) -> EngineResult<serde_json::Value> {
    let operation = submission.operation;
    let target_id = submission.target_id;
    let sources = submission.merge_source_ids.as_slice();
    let data = match &submission.details {
        EditDetails::Tag(details) => {
            encode(&tag::prepare(tx, operation, target_id, sources, details).await?)?
        }
        EditDetails::Performer(details) => {
            encode(&performer::prepare(tx, operation, target_id, sources, details).await?)?
        }
        EditDetails::Studio(details) => {
            encode(&studio::prepare(tx, operation, target_id, sources, details).await?)?
        }
        EditDetails::Scene(details) => {
            encode(&scene::prepare(tx, operation, target_id, sources, details).await?)?
        }
    };
    Ok(data)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn tag_submission(operation: Operation) -> EditSubmission {
        EditSubmission::new(operation, EditDetails::Tag(TagEditDetails::default()))
    }

    #[test]
    fn create_rejects_a_target() {
        let submission = tag_submission(Operation::Create).with_target(3);
        assert_matches!(submission.validate_shape(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn modify_requires_a_target() {
        assert_matches!(
            tag_submission(Operation::Modify).validate_shape(),
            Err(CoreError::Validation(_))
        );
        assert!(tag_submission(Operation::Modify).with_target(3).validate_shape().is_ok());
    }

    #[test]
    fn merge_sources_must_be_distinct_from_target_and_each_other() {
        let base = tag_submission(Operation::Merge).with_target(1);
        assert_matches!(base.clone().validate_shape(), Err(CoreError::Validation(_)));
        assert_matches!(
            base.clone().with_merge_sources(vec![2, 1]).validate_shape(),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            base.clone().with_merge_sources(vec![2, 2]).validate_shape(),
            Err(CoreError::Validation(_))
        );
        assert!(base.with_merge_sources(vec![2, 3]).validate_shape().is_ok());
    }

    #[test]
    fn only_merges_carry_sources() {
        let submission = tag_submission(Operation::Destroy)
            .with_target(1)
            .with_merge_sources(vec![2]);
        assert_matches!(submission.validate_shape(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn blank_comment_is_dropped() {
        let submission = tag_submission(Operation::Create).with_comment("   ");
        assert_eq!(submission.comment_text(), None);
        let submission = tag_submission(Operation::Create).with_comment(" Sourced from site ");
        assert_eq!(submission.comment_text(), Some("Sourced from site"));
    }
}
