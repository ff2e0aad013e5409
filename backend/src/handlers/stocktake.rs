//! HTTP handlers for stocktake endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::{Stocktake, StocktakeLine};
use shared::recompute::StocktakeTotals;

use crate::error::AppResult;
use crate::services::notification::NotificationService;
use crate::services::stocktake::{
    CreateStocktakeInput, LineDetail, PopulateResult, SetCountedUnitsInput, StocktakeService,
};
use crate::AppState;

fn stocktake_service(state: AppState) -> StocktakeService {
    let notifier = NotificationService::from_config(&state.config);
    StocktakeService::new(state.db, notifier)
}

/// Create a stocktake for a period
pub async fn create_stocktake(
    State(state): State<AppState>,
    Json(input): Json<CreateStocktakeInput>,
) -> AppResult<Json<Stocktake>> {
    let service = stocktake_service(state);
    let stocktake = service.create_stocktake(input).await?;
    Ok(Json(stocktake))
}

/// Get a stocktake by id
pub async fn get_stocktake(
    State(state): State<AppState>,
    Path(stocktake_id): Path<Uuid>,
) -> AppResult<Json<Stocktake>> {
    let service = stocktake_service(state);
    let stocktake = service.get_stocktake(stocktake_id).await?;
    Ok(Json(stocktake))
}

/// Populate opening stock lines for every active item
pub async fn populate_opening_stock(
    State(state): State<AppState>,
    Path(stocktake_id): Path<Uuid>,
) -> AppResult<Json<PopulateResult>> {
    let service = stocktake_service(state);
    let result = service.populate_opening_stock(stocktake_id).await?;
    Ok(Json(result))
}

/// Clear a draft stocktake's lines
pub async fn clear_lines(
    State(state): State<AppState>,
    Path(stocktake_id): Path<Uuid>,
) -> AppResult<()> {
    let service = stocktake_service(state);
    service.clear_lines(stocktake_id).await?;
    Ok(())
}

/// Set a line's counted units
pub async fn set_counted_units(
    State(state): State<AppState>,
    Path(line_id): Path<Uuid>,
    Json(input): Json<SetCountedUnitsInput>,
) -> AppResult<Json<StocktakeLine>> {
    let service = stocktake_service(state);
    let line = service.set_counted_units(line_id, input).await?;
    Ok(Json(line))
}

/// Get one line with display decomposition
pub async fn get_line(
    State(state): State<AppState>,
    Path((stocktake_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<LineDetail>> {
    let service = stocktake_service(state);
    let detail = service.get_line(stocktake_id, item_id).await?;
    Ok(Json(detail))
}

/// List a stocktake's lines
pub async fn list_lines(
    State(state): State<AppState>,
    Path(stocktake_id): Path<Uuid>,
) -> AppResult<Json<Vec<StocktakeLine>>> {
    let service = stocktake_service(state);
    let lines = service.list_lines(stocktake_id).await?;
    Ok(Json(lines))
}

/// Value totals across a stocktake
pub async fn get_totals(
    State(state): State<AppState>,
    Path(stocktake_id): Path<Uuid>,
) -> AppResult<Json<StocktakeTotals>> {
    let service = stocktake_service(state);
    let totals = service.totals(stocktake_id).await?;
    Ok(Json(totals))
}

/// Approve a stocktake and close its period
pub async fn approve_stocktake(
    State(state): State<AppState>,
    Path(stocktake_id): Path<Uuid>,
) -> AppResult<Json<Stocktake>> {
    let service = stocktake_service(state);
    let stocktake = service.approve(stocktake_id).await?;
    Ok(Json(stocktake))
}
