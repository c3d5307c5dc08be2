use catalog_core::error::CoreError;
use catalog_core::store::StoreError;

/// Error returned by every engine operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain error: validation, authorization, precondition or a
    /// missing/deleted entity.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Whether applying an edit that hit this error should close it as
    /// failed. Infrastructure errors leave the edit pending so the next
    /// closer run retries it.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EngineError::Store(StoreError::Database(_)))
    }
}

#[cfg(test)]
mod tests {
    use catalog_core::error::PrerequisiteFailure;

    use super::*;

    #[test]
    fn database_errors_are_transient() {
        let err = EngineError::from(StoreError::Database("connection reset".to_string()));
        assert!(!err.is_terminal());
    }

    #[test]
    fn domain_and_missing_row_errors_are_terminal() {
        let failure = PrerequisiteFailure::new("name", "A", "B");
        assert!(EngineError::from(CoreError::PrerequisiteFailed(failure)).is_terminal());
        assert!(EngineError::from(StoreError::RowNotFound { entity: "Tag", id: 4 }).is_terminal());
    }

    #[test]
    fn prerequisite_message_is_passed_through() {
        let failure = PrerequisiteFailure::new("name", "A", "B");
        let err = EngineError::from(CoreError::PrerequisiteFailed(failure));
        assert_eq!(err.to_string(), "Prerequisite failed: Expected name to be **A**, but was **B**.");
    }
}
