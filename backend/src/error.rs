//! Error handling for the Stock Reconciliation Platform
//!
//! Every error a caller can see identifies the offending item/period in its
//! message; precondition failures surface verbatim with no automatic
//! remediation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Reconciliation preconditions
    #[error("Period is locked: {0}")]
    LockedPeriod(String),

    #[error("Period is already closed: {0}")]
    PeriodClosed(String),

    #[error("Stocktake already populated: {0}")]
    AlreadyPopulated(String),

    #[error("A previous period is still open: {0}")]
    PreviousPeriodNotClosed(String),

    #[error("Stocktake has uncounted lines: {0}")]
    IncompleteCount(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<shared::DomainError> for AppError {
    fn from(err: shared::DomainError) -> Self {
        use shared::DomainError;
        let field = match &err {
            DomainError::NonPositiveQuantity { field, .. }
            | DomainError::NegativeQuantity { field, .. } => field.clone(),
            DomainError::NonPositiveUom { .. } => "uom".to_string(),
            DomainError::PartialOutOfRange { .. } | DomainError::PartialPrecision { .. } => {
                "counted_partial_units".to_string()
            }
            DomainError::UnknownCategory(_) => "category".to_string(),
            DomainError::UnknownMovementType(_) => "movement_type".to_string(),
            DomainError::UnknownStatus(_) => "status".to_string(),
            DomainError::InvertedDateRange { .. } => "end_date".to_string(),
        };
        AppError::Validation {
            field,
            message: err.to_string(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::LockedPeriod(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "LOCKED_PERIOD".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::PeriodClosed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "PERIOD_CLOSED".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::AlreadyPopulated(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "ALREADY_POPULATED".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::PreviousPeriodNotClosed(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "PREVIOUS_PERIOD_NOT_CLOSED".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::IncompleteCount(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INCOMPLETE_COUNT".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_STATE_TRANSITION".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
