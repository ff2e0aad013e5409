//! Stock period models

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, non-overlapping stock period
///
/// `year`, `month` and `name` are always derived from the date range; they
/// are never accepted as independent input, so the label can never drift
/// from the actual calendar range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    pub month: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identifiers derived from a period's start date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodIdentifiers {
    pub year: i32,
    pub month: u32,
    pub name: String,
}

/// Derive the display identifiers for a period from its start date.
pub fn derive_identifiers(start_date: NaiveDate) -> PeriodIdentifiers {
    PeriodIdentifiers {
        year: start_date.year(),
        month: start_date.month(),
        name: start_date.format("%B %Y").to_string(),
    }
}
