//! Closing stock snapshot models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The persisted closing count for one item in one period.
///
/// Snapshots are the only source of opening stock: period N reads its
/// opening live from period N-1's closing snapshot, never from a copy.
/// They are written once, by stocktake approval, and read-only after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub id: Uuid,
    pub period_id: Uuid,
    pub item_id: Uuid,
    pub closing_full_units: i64,
    pub closing_partial_units: Decimal,
    /// Raw servings equivalent of the closing pair
    pub closing_qty: Decimal,
    /// closing_qty multiplied by the valuation cost at approval time
    pub closing_stock_value: Decimal,
    pub created_at: DateTime<Utc>,
}
