//! Upfront checks applied to tool arguments before any request is issued.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::vectra::models::{EntityType, TIMESTAMP_FORMAT};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("entity_type must be either 'host' or 'account'.")]
    InvalidEntityType(String),

    #[error("{field} must be greater than or equal to 1, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("Invalid {field} format: {value}. Expected YYYY-MM-DDTHH:MM:SS.")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("start date must be before end date")]
    InvertedRange,
}

/// Parsed lower/upper bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub after: Option<NaiveDateTime>,
    pub before: Option<NaiveDateTime>,
}

pub fn parse_entity_type(raw: &str) -> Result<EntityType, ValidationError> {
    raw.parse()
        .map_err(|_| ValidationError::InvalidEntityType(raw.to_string()))
}

pub fn require_positive(field: &'static str, value: i64) -> Result<i64, ValidationError> {
    if value < 1 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}

/// Parses optional `YYYY-MM-DDTHH:MM:SS` bounds. Empty strings count as absent.
pub fn validate_date_range(
    after: Option<&str>,
    before: Option<&str>,
) -> Result<DateRange, ValidationError> {
    let after = parse_bound("created_after", after)?;
    let before = parse_bound("created_before", before)?;

    if let (Some(a), Some(b)) = (after, before) {
        if a > b {
            return Err(ValidationError::InvertedRange);
        }
    }

    Ok(DateRange { after, before })
}

fn parse_bound(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Option<NaiveDateTime>, ValidationError> {
    match raw.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .map(Some)
            .map_err(|_| ValidationError::InvalidTimestamp {
                field,
                value: s.to_string(),
            }),
    }
}
