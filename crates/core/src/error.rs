use std::fmt;

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Entity is deleted: {entity} with id {id}")]
    EntityDeleted { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Prerequisite failed: {0}")]
    PrerequisiteFailed(PrerequisiteFailure),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A field whose live value no longer matches the value recorded in an
/// edit's `Old` half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisiteFailure {
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

impl PrerequisiteFailure {
    pub fn new(field: &'static str, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            field,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

fn emphasize(value: &str) -> String {
    if value.is_empty() {
        "_blank_".to_string()
    } else {
        format!("**{value}**")
    }
}

impl fmt::Display for PrerequisiteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} to be {}, but was {}.",
            self.field,
            emphasize(&self.expected),
            emphasize(&self.actual)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prerequisite_message_marks_blank_values() {
        let failure = PrerequisiteFailure::new("name", "Foo", "");
        assert_eq!(
            failure.to_string(),
            "Expected name to be **Foo**, but was _blank_."
        );
    }

    #[test]
    fn prerequisite_failed_error_wraps_message() {
        let err = CoreError::PrerequisiteFailed(PrerequisiteFailure::new("name", "Foo", "Bar"));
        assert_eq!(
            err.to_string(),
            "Prerequisite failed: Expected name to be **Foo**, but was **Bar**."
        );
    }
}
