//! Pure stocktake line recomputation
//!
//! The engine is a deterministic function of the line's inputs (opening
//! stock, movement sums, counted input) and the item's conversion rules.
//! Running it twice with the same inputs yields identical output, which is
//! what lets the backend re-run it after every ledger mutation without
//! drift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainResult;
use crate::models::{CountedUnits, Item, MovementSums};
use crate::uom;

/// Derived values for one stocktake line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DerivedLine {
    pub expected_qty: Decimal,
    pub expected_value: Decimal,
    pub counted_qty: Option<Decimal>,
    pub counted_value: Option<Decimal>,
    pub variance_qty: Option<Decimal>,
    pub variance_value: Option<Decimal>,
}

/// Recompute a line's expected/counted/variance values.
///
/// `expected_qty = opening + purchases + transfers_in - sales - waste -
/// transfers_out + adjustments`. A negative result is legal output: it means
/// the recorded movements exceed opening plus purchases, which is a
/// data-entry problem upstream and must stay visible rather than be clamped.
///
/// Counted and variance values are only produced once a count has been
/// entered; `counted_qty` is always the converted pair, never raw servings.
pub fn recompute_line(
    item: &Item,
    opening_qty: Decimal,
    sums: &MovementSums,
    counted: Option<CountedUnits>,
) -> DomainResult<DerivedLine> {
    let expected_qty = opening_qty + sums.net();
    let expected_value = expected_qty * item.unit_cost;

    let counted_qty = match counted {
        Some(units) => Some(uom::to_servings(units.full, units.partial, item)?),
        None => None,
    };
    let counted_value = counted_qty.map(|qty| qty * item.unit_cost);
    let variance_qty = counted_qty.map(|qty| qty - expected_qty);
    let variance_value = variance_qty.map(|qty| qty * item.unit_cost);

    Ok(DerivedLine {
        expected_qty,
        expected_value,
        counted_qty,
        counted_value,
        variance_qty,
        variance_value,
    })
}

/// Produce the display decomposition of a line's quantity states.
///
/// Opening, expected and counted each decompose their own non-negative raw
/// value independently; variance decomposes the signed value with the sign
/// carried onto both display components.
pub fn line_display(
    item: &Item,
    opening_qty: Decimal,
    derived: &DerivedLine,
) -> DomainResult<crate::models::LineDisplay> {
    let opening = uom::to_display(opening_qty, item)?;
    // Expected can legitimately go negative; present it signed.
    let expected = uom::to_signed_display(derived.expected_qty, item)?;
    let counted = match derived.counted_qty {
        Some(qty) => Some(uom::to_display(qty, item)?),
        None => None,
    };
    let variance = match derived.variance_qty {
        Some(qty) => Some(uom::to_signed_display(qty, item)?),
        None => None,
    };
    Ok(crate::models::LineDisplay {
        opening,
        expected,
        counted,
        variance,
    })
}

/// Roll a batch of derived lines up into stocktake totals
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StocktakeTotals {
    pub expected_value: Decimal,
    pub counted_value: Decimal,
    pub variance_value: Decimal,
}

pub fn total_values<'a, I>(lines: I) -> StocktakeTotals
where
    I: IntoIterator<Item = &'a DerivedLine>,
{
    let mut totals = StocktakeTotals::default();
    for line in lines {
        totals.expected_value += line.expected_value;
        totals.counted_value += line.counted_value.unwrap_or_default();
        totals.variance_value += line.variance_value.unwrap_or_default();
    }
    totals
}
