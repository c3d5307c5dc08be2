//! Precondition and input validators.

use std::fmt::Display;

use crate::error::{CoreError, PrerequisiteFailure};
use crate::relations::{BodyModification, Url};

/// Verify that a recorded `old` value still matches the live value.
///
/// Fields absent from `old` were not touched by the edit and always pass.
pub fn check_field<T: PartialEq + Display>(
    field: &'static str,
    old: Option<&T>,
    current: Option<&T>,
) -> Result<(), CoreError> {
    let Some(expected) = old else {
        return Ok(());
    };
    if current == Some(expected) {
        return Ok(());
    }
    Err(CoreError::PrerequisiteFailed(PrerequisiteFailure::new(
        field,
        expected.to_string(),
        current.map(ToString::to_string).unwrap_or_default(),
    )))
}

/// Reject a missing or blank required string.
pub fn require_non_blank(field: &str, value: Option<&str>) -> Result<(), CoreError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(CoreError::Validation(format!("{field} is required"))),
    }
}

/// Reject a value that is explicitly cleared when the field is required.
pub fn reject_clear<T>(field: &str, value: &Option<Option<T>>) -> Result<(), CoreError> {
    if matches!(value, Some(None)) {
        return Err(CoreError::Validation(format!("{field} cannot be cleared")));
    }
    Ok(())
}

pub fn validate_urls(urls: &[Url]) -> Result<(), CoreError> {
    for url in urls {
        if url.url.trim().is_empty() {
            return Err(CoreError::Validation("URL must not be empty".to_string()));
        }
        if !(url.url.starts_with("http://") || url.url.starts_with("https://")) {
            return Err(CoreError::Validation(format!(
                "URL '{}' must start with http:// or https://",
                url.url
            )));
        }
    }
    Ok(())
}

pub fn validate_body_modifications(field: &str, mods: &[BodyModification]) -> Result<(), CoreError> {
    if mods.iter().any(|m| m.location.trim().is_empty()) {
        return Err(CoreError::Validation(format!("{field} location must not be empty")));
    }
    Ok(())
}

/// Validate an optional year range such as a career span.
pub fn validate_year_range(start: Option<i32>, end: Option<i32>) -> Result<(), CoreError> {
    for year in [start, end].into_iter().flatten() {
        if !(1900..=2100).contains(&year) {
            return Err(CoreError::Validation(format!("Year {year} is out of range")));
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(CoreError::Validation(format!(
                "Career start year {start} is after end year {end}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn untouched_field_always_passes() {
        assert!(check_field::<String>("name", None, Some(&"x".to_string())).is_ok());
    }

    #[test]
    fn mismatched_field_reports_expected_and_actual() {
        let old = "Foo".to_string();
        let current = "Bar".to_string();
        let err = check_field("name", Some(&old), Some(&current)).unwrap_err();
        assert_matches!(err, CoreError::PrerequisiteFailed(f) => {
            assert_eq!(f.field, "name");
            assert_eq!(f.expected, "Foo");
            assert_eq!(f.actual, "Bar");
        });
    }

    #[test]
    fn missing_live_value_fails_when_old_recorded() {
        assert!(check_field("height", Some(&170), None).is_err());
    }

    #[test]
    fn url_must_have_scheme() {
        assert!(validate_urls(&[Url::new("example.com", "web")]).is_err());
        assert!(validate_urls(&[Url::new("https://example.com", "web")]).is_ok());
    }

    #[test]
    fn year_range_must_be_ordered() {
        assert!(validate_year_range(Some(2010), Some(2005)).is_err());
        assert!(validate_year_range(Some(2005), None).is_ok());
    }
}
