//! Stock item reference data

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::uom::UnitStyle;

/// A sellable stock item (catalog reference data, read-only to the core)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    /// Unique stock-keeping unit code (e.g., "DR-TENN-50L")
    pub sku: String,
    pub name: String,
    pub category: Category,
    /// Pack size description (e.g., "50L keg", "dozen 330ml", "70cl")
    pub size: Option<String>,
    /// Servings per full unit (88 pints/keg, 12 bottles/case, 28 shots/bottle)
    pub uom: Decimal,
    /// Valuation cost per serving
    pub unit_cost: Decimal,
    /// Menu/bottle selling price per serving
    pub menu_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Stock categories, each with its own display/rounding behaviour
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Draught,
    BottledBeer,
    Spirits,
    Wine,
    Minerals,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Draught => "draught",
            Category::BottledBeer => "bottled_beer",
            Category::Spirits => "spirits",
            Category::Wine => "wine",
            Category::Minerals => "minerals",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "draught" => Some(Category::Draught),
            "bottled_beer" => Some(Category::BottledBeer),
            "spirits" => Some(Category::Spirits),
            "wine" => Some(Category::Wine),
            "minerals" => Some(Category::Minerals),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Draught => write!(f, "Draught"),
            Category::BottledBeer => write!(f, "Bottled Beer"),
            Category::Spirits => write!(f, "Spirits"),
            Category::Wine => write!(f, "Wine"),
            Category::Minerals => write!(f, "Minerals"),
        }
    }
}

impl Item {
    /// Resolve the display/rounding style for this item.
    ///
    /// Minerals sold by the dozen count loose bottles like bottled beer;
    /// everything else in that category falls back to bottle-and-fraction.
    pub fn unit_style(&self) -> UnitStyle {
        match self.category {
            Category::Draught => UnitStyle::KegAndPints,
            Category::BottledBeer => UnitStyle::CaseAndBottles,
            Category::Minerals => {
                if self
                    .size
                    .as_deref()
                    .map(|s| s.to_ascii_lowercase().contains("doz"))
                    .unwrap_or(false)
                {
                    UnitStyle::CaseAndBottles
                } else {
                    UnitStyle::BottleAndFraction
                }
            }
            Category::Spirits | Category::Wine => UnitStyle::BottleAndFraction,
        }
    }
}
