//! Route definitions for the Stock Reconciliation Platform

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Catalog
        .nest("/items", item_routes())
        // Periods and snapshots
        .nest("/periods", period_routes())
        // Movement ledger
        .nest("/movements", movement_routes())
        // Stocktakes
        .nest("/stocktakes", stocktake_routes())
}

/// Catalog item routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/:item_id", get(handlers::get_item))
}

/// Period and snapshot routes
fn period_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_periods).post(handlers::create_period),
        )
        .route("/:period_id", get(handlers::get_period))
        .route(
            "/:period_id/snapshots/:item_id",
            get(handlers::get_snapshot),
        )
        .route("/:period_id/opening/:item_id", get(handlers::get_opening))
        .route(
            "/:period_id/movement-sums/:item_id",
            get(handlers::get_movement_sums),
        )
}

/// Movement ledger routes
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_movements).post(handlers::record_movement),
        )
        .route(
            "/:movement_id",
            get(handlers::get_movement)
                .put(handlers::update_movement)
                .delete(handlers::delete_movement),
        )
}

/// Stocktake routes
fn stocktake_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_stocktake))
        .route("/:stocktake_id", get(handlers::get_stocktake))
        .route(
            "/:stocktake_id/populate",
            post(handlers::populate_opening_stock),
        )
        .route(
            "/:stocktake_id/lines",
            get(handlers::list_lines).delete(handlers::clear_lines),
        )
        .route(
            "/:stocktake_id/lines/:item_id",
            get(handlers::get_line),
        )
        .route("/lines/:line_id/counted", put(handlers::set_counted_units))
        .route("/:stocktake_id/totals", get(handlers::get_totals))
        .route("/:stocktake_id/approve", post(handlers::approve_stocktake))
}
