//! HTTP handlers for period and snapshot endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::models::{Period, StockSnapshot};

use crate::error::{AppError, AppResult};
use crate::services::period::{CreatePeriodInput, PeriodService};
use crate::AppState;

/// Create a period from a date range
pub async fn create_period(
    State(state): State<AppState>,
    Json(input): Json<CreatePeriodInput>,
) -> AppResult<Json<Period>> {
    let service = PeriodService::new(state.db);
    let period = service.create_period(input).await?;
    Ok(Json(period))
}

/// Get a period by id
pub async fn get_period(
    State(state): State<AppState>,
    Path(period_id): Path<Uuid>,
) -> AppResult<Json<Period>> {
    let service = PeriodService::new(state.db);
    let period = service.get_period(period_id).await?;
    Ok(Json(period))
}

/// List all periods
pub async fn list_periods(State(state): State<AppState>) -> AppResult<Json<Vec<Period>>> {
    let service = PeriodService::new(state.db);
    let periods = service.list_periods().await?;
    Ok(Json(periods))
}

/// Get an item's closing snapshot for a period
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path((period_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<StockSnapshot>> {
    let service = PeriodService::new(state.db);
    let snapshot = service
        .get_closing_snapshot(period_id, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Snapshot".to_string()))?;
    Ok(Json(snapshot))
}

#[derive(Serialize)]
pub struct OpeningResponse {
    pub item_id: Uuid,
    pub period_id: Uuid,
    pub opening_qty: Decimal,
}

/// Get an item's opening stock for a period (previous closing snapshot)
pub async fn get_opening(
    State(state): State<AppState>,
    Path((period_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<OpeningResponse>> {
    let service = PeriodService::new(state.db);
    let period = service.get_period(period_id).await?;
    let opening_qty = service.get_opening_for(item_id, period.start_date).await?;
    Ok(Json(OpeningResponse {
        item_id,
        period_id,
        opening_qty,
    }))
}
