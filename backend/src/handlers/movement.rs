//! HTTP handlers for stock movement endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{MovementSums, StockMovement};

use crate::error::AppResult;
use crate::services::movement::{MovementService, RecordMovementInput, UpdateMovementInput};
use crate::services::notification::NotificationService;
use crate::AppState;

fn movement_service(state: AppState) -> MovementService {
    let notifier = NotificationService::from_config(&state.config);
    MovementService::new(state.db, notifier)
}

/// Record a stock movement
pub async fn record_movement(
    State(state): State<AppState>,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<Json<StockMovement>> {
    let service = movement_service(state);
    let movement = service.record(input).await?;
    Ok(Json(movement))
}

/// Update an existing movement
pub async fn update_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
    Json(input): Json<UpdateMovementInput>,
) -> AppResult<Json<StockMovement>> {
    let service = movement_service(state);
    let movement = service.update(movement_id, input).await?;
    Ok(Json(movement))
}

/// Delete a movement
pub async fn delete_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<()> {
    let service = movement_service(state);
    service.delete(movement_id).await?;
    Ok(())
}

/// Get a movement by id
pub async fn get_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<StockMovement>> {
    let service = movement_service(state);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}

#[derive(Deserialize)]
pub struct ListMovementsQuery {
    pub period_id: Uuid,
    pub item_id: Option<Uuid>,
}

/// List movements for a period (optionally one item)
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<ListMovementsQuery>,
) -> AppResult<Json<Vec<StockMovement>>> {
    let service = movement_service(state);
    let movements = service
        .list_movements(query.period_id, query.item_id)
        .await?;
    Ok(Json(movements))
}

/// Per-type movement totals for one item in one period
pub async fn get_movement_sums(
    State(state): State<AppState>,
    Path((period_id, item_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<MovementSums>> {
    let service = movement_service(state);
    let sums = service.sum_by_type(item_id, period_id).await?;
    Ok(Json(sums))
}
