//! Unit-of-measure conversion between raw servings and display pairs
//!
//! All internal arithmetic is in servings (pints, shots, bottles). Display
//! decomposes servings into whole containers plus a remainder whose type and
//! rounding depend on the item's category.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::models::Item;

/// How an item's quantities are decomposed for display.
///
/// The style dictates what the partial component means in `to_servings`:
/// loose bottles and draught pints are already servings, while a
/// bottle-and-fraction partial is a fraction of one full unit. That
/// asymmetry is deliberate and round-trips depend on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitStyle {
    /// Cases plus loose bottles, both whole numbers
    CaseAndBottles,
    /// Kegs plus pints to two decimal places
    KegAndPints,
    /// Bottles plus a fraction of a bottle in [0, 1)
    BottleAndFraction,
}

/// A human-facing (full units, partial units) pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayUnits {
    pub full: i64,
    pub partial: Decimal,
}

impl DisplayUnits {
    pub const ZERO: DisplayUnits = DisplayUnits {
        full: 0,
        partial: Decimal::ZERO,
    };

    /// Negate both components; used to present signed variance pairs
    pub fn negate(&self) -> DisplayUnits {
        DisplayUnits {
            full: -self.full,
            partial: -self.partial,
        }
    }
}

fn check_uom(item: &Item) -> DomainResult<()> {
    if item.uom <= Decimal::ZERO {
        return Err(DomainError::NonPositiveUom {
            sku: item.sku.clone(),
            uom: item.uom.to_string(),
        });
    }
    Ok(())
}

fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Decompose non-negative raw servings into a display pair.
///
/// `full = floor(servings / uom)`, the remainder is rounded per the item's
/// style. Rounding may push the remainder up to a whole unit (e.g. 11.6
/// loose bottles of a dozen); that carries into `full` so the partial
/// component always stays below one unit.
pub fn to_display(servings: Decimal, item: &Item) -> DomainResult<DisplayUnits> {
    check_uom(item)?;
    if servings < Decimal::ZERO {
        return Err(DomainError::NegativeQuantity {
            field: "servings".to_string(),
            value: servings.to_string(),
        });
    }
    if servings.is_zero() {
        return Ok(DisplayUnits::ZERO);
    }

    let mut full = (servings / item.uom).floor();
    let remainder = servings - full * item.uom;

    let mut partial = match item.unit_style() {
        UnitStyle::CaseAndBottles => round_half_up(remainder, 0),
        UnitStyle::KegAndPints => round_half_up(remainder, 2),
        UnitStyle::BottleAndFraction => round_half_up(remainder / item.uom, 2),
    };

    // Carry when rounding reaches a whole unit
    let limit = match item.unit_style() {
        UnitStyle::BottleAndFraction => Decimal::ONE,
        _ => item.uom,
    };
    if partial >= limit {
        full += Decimal::ONE;
        partial = Decimal::ZERO;
    }

    let full = full.to_i64().ok_or_else(|| DomainError::NegativeQuantity {
        field: "servings".to_string(),
        value: servings.to_string(),
    })?;

    Ok(DisplayUnits { full, partial })
}

/// Decompose a signed servings value, carrying the sign onto both display
/// components so it is never silently dropped (a zero `full` would lose it).
pub fn to_signed_display(servings: Decimal, item: &Item) -> DomainResult<DisplayUnits> {
    if servings < Decimal::ZERO {
        Ok(to_display(-servings, item)?.negate())
    } else {
        to_display(servings, item)
    }
}

/// Recompose a display pair into raw servings. Exact inverse of
/// [`to_display`] for pairs within range.
///
/// Loose bottles and draught pints are already servings; a
/// bottle-and-fraction partial is scaled by the item's uom.
pub fn to_servings(full: i64, partial: Decimal, item: &Item) -> DomainResult<Decimal> {
    check_uom(item)?;
    if full < 0 {
        return Err(DomainError::NegativeQuantity {
            field: "full_units".to_string(),
            value: full.to_string(),
        });
    }
    if partial < Decimal::ZERO {
        return Err(DomainError::NegativeQuantity {
            field: "partial_units".to_string(),
            value: partial.to_string(),
        });
    }

    let full = Decimal::from(full);
    let servings = match item.unit_style() {
        UnitStyle::CaseAndBottles | UnitStyle::KegAndPints => full * item.uom + partial,
        UnitStyle::BottleAndFraction => full * item.uom + partial * item.uom,
    };
    Ok(servings)
}
