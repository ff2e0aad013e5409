//! Stock movement ledger models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Types of stock-affecting events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Purchase,
    Sale,
    Waste,
    TransferIn,
    TransferOut,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Purchase => "purchase",
            MovementType::Sale => "sale",
            MovementType::Waste => "waste",
            MovementType::TransferIn => "transfer_in",
            MovementType::TransferOut => "transfer_out",
            MovementType::Adjustment => "adjustment",
        }
    }

    pub fn parse(s: &str) -> Option<MovementType> {
        match s {
            "purchase" => Some(MovementType::Purchase),
            "sale" => Some(MovementType::Sale),
            "waste" => Some(MovementType::Waste),
            "transfer_in" => Some(MovementType::TransferIn),
            "transfer_out" => Some(MovementType::TransferOut),
            "adjustment" => Some(MovementType::Adjustment),
            _ => None,
        }
    }

    /// Signed contribution of one unit of this movement to expected stock
    pub fn sign(&self) -> Decimal {
        match self {
            MovementType::Purchase | MovementType::TransferIn | MovementType::Adjustment => {
                Decimal::ONE
            }
            MovementType::Sale | MovementType::Waste | MovementType::TransferOut => {
                Decimal::NEGATIVE_ONE
            }
        }
    }
}

/// One append-only stock-affecting event, scoped to an item and a period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub item_id: Uuid,
    pub period_id: Uuid,
    pub movement_type: MovementType,
    /// Quantity in servings, always positive
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub moved_at: DateTime<Utc>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Per-type movement totals for one (item, period), all in servings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MovementSums {
    pub purchases: Decimal,
    pub sales: Decimal,
    pub waste: Decimal,
    pub transfers_in: Decimal,
    pub transfers_out: Decimal,
    pub adjustments: Decimal,
}

impl MovementSums {
    /// Add one movement's quantity into the matching bucket
    pub fn add(&mut self, movement_type: MovementType, quantity: Decimal) {
        match movement_type {
            MovementType::Purchase => self.purchases += quantity,
            MovementType::Sale => self.sales += quantity,
            MovementType::Waste => self.waste += quantity,
            MovementType::TransferIn => self.transfers_in += quantity,
            MovementType::TransferOut => self.transfers_out += quantity,
            MovementType::Adjustment => self.adjustments += quantity,
        }
    }

    /// Net signed contribution of all buckets
    pub fn net(&self) -> Decimal {
        self.purchases + self.transfers_in + self.adjustments
            - self.sales
            - self.waste
            - self.transfers_out
    }
}
