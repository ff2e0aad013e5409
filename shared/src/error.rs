//! Domain-level errors raised by the pure reconciliation core

use thiserror::Error;

/// Errors produced by pure domain logic (conversion, validation, recompute).
///
/// The backend maps these onto its HTTP error taxonomy; here they carry just
/// enough context to identify the offending value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{field} must be positive, got {value}")]
    NonPositiveQuantity { field: String, value: String },

    #[error("{field} cannot be negative, got {value}")]
    NegativeQuantity { field: String, value: String },

    #[error("item {sku} has a non-positive unit of measure ({uom})")]
    NonPositiveUom { sku: String, uom: String },

    #[error("partial units {value} out of range for {sku} (must be below {limit})")]
    PartialOutOfRange {
        sku: String,
        value: String,
        limit: String,
    },

    #[error("partial units {value} carry more precision than {sku} allows")]
    PartialPrecision { sku: String, value: String },

    #[error("unknown category code: {0}")]
    UnknownCategory(String),

    #[error("unknown movement type: {0}")]
    UnknownMovementType(String),

    #[error("unknown stocktake status: {0}")]
    UnknownStatus(String),

    #[error("period end date {end} precedes start date {start}")]
    InvertedDateRange { start: String, end: String },
}

/// Result alias for pure domain operations
pub type DomainResult<T> = Result<T, DomainError>;
