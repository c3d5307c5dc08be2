//! Row types returned by the repositories and their conversions into
//! `catalog_core` domain types.

pub mod edit;
pub mod entity;
pub mod notification;

use std::fmt::Display;
use std::str::FromStr;

use catalog_core::fuzzy_date::FuzzyDate;
use catalog_core::store::StoreError;

/// Parse a TEXT column holding a canonical enum string.
pub(crate) fn parse_column<T>(column: &'static str, value: &str) -> Result<T, StoreError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| StoreError::Database(format!("Invalid value in column {column}: {e}")))
}

pub(crate) fn parse_optional_column<T>(
    column: &'static str,
    value: Option<&str>,
) -> Result<Option<T>, StoreError>
where
    T: FromStr,
    T::Err: Display,
{
    value.map(|v| parse_column(column, v)).transpose()
}

/// Rebuild a fuzzy date from its date and accuracy columns.
pub(crate) fn fuzzy_date_from_columns(
    column: &'static str,
    date: Option<String>,
    accuracy: Option<&str>,
) -> Result<Option<FuzzyDate>, StoreError> {
    let Some(date) = date else {
        return Ok(None);
    };
    let accuracy = match accuracy {
        Some(value) => parse_column(column, value)?,
        None => FuzzyDate::parse(&date)
            .map_err(|e| StoreError::Database(format!("Invalid value in column {column}: {e}")))?
            .accuracy,
    };
    Ok(Some(FuzzyDate { date, accuracy }))
}
