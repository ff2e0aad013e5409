//! Stocktake and stocktake line models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::uom::DisplayUnits;

/// Lifecycle states of a stocktake
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StocktakeStatus {
    Draft,
    Approved,
}

impl StocktakeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StocktakeStatus::Draft => "draft",
            StocktakeStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<StocktakeStatus> {
        match s {
            "draft" => Some(StocktakeStatus::Draft),
            "approved" => Some(StocktakeStatus::Approved),
            _ => None,
        }
    }
}

/// An editable counting session for one period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stocktake {
    pub id: Uuid,
    pub period_id: Uuid,
    pub status: StocktakeStatus,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stocktake {
    /// Counted fields and movements may only change while the stocktake is
    /// a draft and not locked.
    pub fn is_editable(&self) -> bool {
        self.status == StocktakeStatus::Draft && !self.is_locked
    }
}

/// Counted physical units as entered by staff
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountedUnits {
    pub full: i64,
    pub partial: Decimal,
}

/// One reconciliation row per (stocktake, item)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StocktakeLine {
    pub id: Uuid,
    pub stocktake_id: Uuid,
    pub item_id: Uuid,
    /// Opening stock in servings, read from the previous period's snapshot
    pub opening_qty: Decimal,
    /// Movement aggregates in servings, kept in sync with the ledger
    pub purchases: Decimal,
    pub sales: Decimal,
    pub waste: Decimal,
    pub transfers_in: Decimal,
    pub transfers_out: Decimal,
    pub adjustments: Decimal,
    /// Counted input; both components unset until staff count the item
    pub counted_full_units: Option<i64>,
    pub counted_partial_units: Option<Decimal>,
    pub expected_qty: Decimal,
    pub expected_value: Decimal,
    pub counted_qty: Option<Decimal>,
    pub counted_value: Option<Decimal>,
    pub variance_qty: Option<Decimal>,
    pub variance_value: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl StocktakeLine {
    /// Whether staff have entered a count for this line
    pub fn is_counted(&self) -> bool {
        self.counted_full_units.is_some() && self.counted_partial_units.is_some()
    }

    pub fn counted_units(&self) -> Option<CountedUnits> {
        match (self.counted_full_units, self.counted_partial_units) {
            (Some(full), Some(partial)) => Some(CountedUnits { full, partial }),
            _ => None,
        }
    }

    /// The counted pair with its derived quantity and value, present only
    /// when all of them are. A row with a counted pair but missing derived
    /// columns is out of sync and must not be committed as a snapshot.
    pub fn counted_snapshot(&self) -> Option<(CountedUnits, Decimal, Decimal)> {
        let units = self.counted_units()?;
        let qty = self.counted_qty?;
        let value = self.counted_value?;
        Some((units, qty, value))
    }
}

/// Why a stocktake cannot be approved yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalGap {
    /// The stocktake has no lines at all; approving it would close the
    /// period with no snapshots and zero every next-period opening
    NoLines,
    /// Items whose lines have no counted units
    Uncounted(Vec<Uuid>),
}

/// Check that a stocktake's lines are complete enough to approve.
pub fn check_ready_for_approval(lines: &[StocktakeLine]) -> Result<(), ApprovalGap> {
    if lines.is_empty() {
        return Err(ApprovalGap::NoLines);
    }
    let uncounted: Vec<Uuid> = lines
        .iter()
        .filter(|line| !line.is_counted())
        .map(|line| line.item_id)
        .collect();
    if uncounted.is_empty() {
        Ok(())
    } else {
        Err(ApprovalGap::Uncounted(uncounted))
    }
}

/// Display decomposition of a line's four quantity states
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineDisplay {
    pub opening: DisplayUnits,
    pub expected: DisplayUnits,
    pub counted: Option<DisplayUnits>,
    /// Signed pair; both components carry the sign of the variance
    pub variance: Option<DisplayUnits>,
}
