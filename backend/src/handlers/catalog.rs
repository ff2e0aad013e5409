//! HTTP handlers for catalog endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::Item;

use crate::error::AppResult;
use crate::services::catalog::{CatalogService, CreateItemInput};
use crate::AppState;

/// Create a catalog item
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<Item>> {
    let service = CatalogService::new(state.db);
    let item = service.create_item(input).await?;
    Ok(Json(item))
}

/// Get an item by id
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Item>> {
    let service = CatalogService::new(state.db);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// List all catalog items
pub async fn list_items(State(state): State<AppState>) -> AppResult<Json<Vec<Item>>> {
    let service = CatalogService::new(state.db);
    let items = service.list_items().await?;
    Ok(Json(items))
}
