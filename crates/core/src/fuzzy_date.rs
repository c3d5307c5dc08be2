//! Partial dates with an explicit precision.
//!
//! A birthdate or release date is often only known to the year or month.
//! The date string and its accuracy are stored, diffed and applied as one
//! unit.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

static FUZZY_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}(-\d{2}(-\d{2})?)?$").expect("valid regex"));

string_enum! {
    DateAccuracy {
        Year => "YEAR",
        Month => "MONTH",
        Day => "DAY",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuzzyDate {
    pub date: String,
    pub accuracy: DateAccuracy,
}

impl FuzzyDate {
    /// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`. Accuracy follows the
    /// number of components present.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let value = value.trim();
        if !FUZZY_DATE_RE.is_match(value) {
            return Err(CoreError::Validation(format!(
                "Invalid date '{value}'. Expected YYYY, YYYY-MM or YYYY-MM-DD"
            )));
        }
        let (padded, accuracy) = match value.len() {
            4 => (format!("{value}-01-01"), DateAccuracy::Year),
            7 => (format!("{value}-01"), DateAccuracy::Month),
            _ => (value.to_string(), DateAccuracy::Day),
        };
        NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
            .map_err(|_| CoreError::Validation(format!("Invalid date '{value}'")))?;
        Ok(Self {
            date: value.to_string(),
            accuracy,
        })
    }

    /// Check a date built field by field, as deserialized input is. The
    /// string must parse and its accuracy must match the stored one.
    pub fn validate(&self) -> Result<(), CoreError> {
        let parsed = Self::parse(&self.date)?;
        if parsed.date != self.date || parsed.accuracy != self.accuracy {
            return Err(CoreError::Validation(format!(
                "Date '{}' does not have {} accuracy",
                self.date, self.accuracy
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FuzzyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_follows_component_count() {
        assert_eq!(FuzzyDate::parse("1990").unwrap().accuracy, DateAccuracy::Year);
        assert_eq!(FuzzyDate::parse("1990-04").unwrap().accuracy, DateAccuracy::Month);
        assert_eq!(FuzzyDate::parse("1990-04-12").unwrap().accuracy, DateAccuracy::Day);
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(FuzzyDate::parse("1990-13").is_err());
        assert!(FuzzyDate::parse("1990-02-30").is_err());
        assert!(FuzzyDate::parse("April 1990").is_err());
    }

    #[test]
    fn validate_rejects_hand_built_mismatches() {
        let malformed = FuzzyDate {
            date: "90-4-12".to_string(),
            accuracy: DateAccuracy::Day,
        };
        assert!(malformed.validate().is_err());

        let too_precise = FuzzyDate {
            date: "1990".to_string(),
            accuracy: DateAccuracy::Day,
        };
        assert!(too_precise.validate().is_err());

        let padded = FuzzyDate {
            date: " 1990".to_string(),
            accuracy: DateAccuracy::Year,
        };
        assert!(padded.validate().is_err());

        assert!(FuzzyDate::parse("1990-04").unwrap().validate().is_ok());
    }
}
