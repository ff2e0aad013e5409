//! Validation utilities for the Stock Reconciliation Platform

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};
use crate::models::Item;
use crate::uom::UnitStyle;

// ============================================================================
// Movement validations
// ============================================================================

/// Movement quantities are always positive servings; direction comes from
/// the movement type, never from the sign.
pub fn validate_movement_quantity(quantity: Decimal) -> DomainResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(DomainError::NonPositiveQuantity {
            field: "quantity".to_string(),
            value: quantity.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Catalog validations
// ============================================================================

/// An item with a non-positive uom would make every conversion divide by
/// zero or worse; it is rejected at the catalog boundary.
pub fn validate_item_uom(sku: &str, uom: Decimal) -> DomainResult<()> {
    if uom <= Decimal::ZERO {
        return Err(DomainError::NonPositiveUom {
            sku: sku.to_string(),
            uom: uom.to_string(),
        });
    }
    Ok(())
}

pub fn validate_item_cost(unit_cost: Decimal) -> DomainResult<()> {
    if unit_cost < Decimal::ZERO {
        return Err(DomainError::NegativeQuantity {
            field: "unit_cost".to_string(),
            value: unit_cost.to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// Counted input validations
// ============================================================================

/// Validate a counted (full, partial) pair against the item's unit style.
///
/// Loose bottles must stay below one case, draught pints below one keg, and
/// a bottle fraction below one whole bottle. A partial at or above the limit
/// is a data-entry slip the converter must never paper over by carrying.
///
/// Precision is also style-bound: loose bottles are whole numbers and pints
/// carry at most two decimals. Anything finer would be stored as entered but
/// display as a different pair, so it is rejected at the boundary.
pub fn validate_counted_units(item: &Item, full: i64, partial: Decimal) -> DomainResult<()> {
    if full < 0 {
        return Err(DomainError::NegativeQuantity {
            field: "counted_full_units".to_string(),
            value: full.to_string(),
        });
    }
    if partial < Decimal::ZERO {
        return Err(DomainError::NegativeQuantity {
            field: "counted_partial_units".to_string(),
            value: partial.to_string(),
        });
    }

    let style = item.unit_style();
    let precise_enough = match style {
        UnitStyle::CaseAndBottles => partial.fract().is_zero(),
        UnitStyle::KegAndPints | UnitStyle::BottleAndFraction => partial == partial.round_dp(2),
    };
    if !precise_enough {
        return Err(DomainError::PartialPrecision {
            sku: item.sku.clone(),
            value: partial.to_string(),
        });
    }

    let limit = match style {
        UnitStyle::CaseAndBottles | UnitStyle::KegAndPints => item.uom,
        UnitStyle::BottleAndFraction => Decimal::ONE,
    };
    if partial >= limit {
        return Err(DomainError::PartialOutOfRange {
            sku: item.sku.clone(),
            value: partial.to_string(),
            limit: limit.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::Utc;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(category: Category, uom: &str, size: Option<&str>) -> Item {
        Item {
            id: Uuid::new_v4(),
            sku: "TEST-001".to_string(),
            name: "Test item".to_string(),
            category,
            size: size.map(str::to_string),
            uom: dec(uom),
            unit_cost: dec("1.00"),
            menu_price: dec("2.00"),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_non_positive_movement_quantity() {
        assert!(validate_movement_quantity(dec("0")).is_err());
        assert!(validate_movement_quantity(dec("-1.5")).is_err());
        assert!(validate_movement_quantity(dec("0.25")).is_ok());
    }

    #[test]
    fn rejects_non_positive_uom() {
        assert!(validate_item_uom("X", dec("0")).is_err());
        assert!(validate_item_uom("X", dec("-12")).is_err());
        assert!(validate_item_uom("X", dec("88")).is_ok());
    }

    #[test]
    fn counted_partial_must_stay_below_one_case() {
        let beer = item(Category::BottledBeer, "12", None);
        assert!(validate_counted_units(&beer, 3, dec("11")).is_ok());
        assert!(validate_counted_units(&beer, 3, dec("12")).is_err());
    }

    #[test]
    fn counted_fraction_must_stay_below_one_bottle() {
        let gin = item(Category::Spirits, "28", Some("70cl"));
        assert!(validate_counted_units(&gin, 5, dec("0.75")).is_ok());
        assert!(validate_counted_units(&gin, 5, dec("1.00")).is_err());
    }

    #[test]
    fn counted_loose_bottles_must_be_whole() {
        let beer = item(Category::BottledBeer, "12", None);
        // (6, 5.5) would display back as a different pair; reject it
        assert!(validate_counted_units(&beer, 6, dec("5.5")).is_err());
        assert!(validate_counted_units(&beer, 6, dec("5")).is_ok());
    }

    #[test]
    fn counted_pints_capped_at_two_decimals() {
        let keg = item(Category::Draught, "88", Some("50L keg"));
        assert!(validate_counted_units(&keg, 1, dec("23.75")).is_ok());
        assert!(validate_counted_units(&keg, 1, dec("23.750")).is_ok());
        assert!(validate_counted_units(&keg, 1, dec("23.755")).is_err());
    }

    #[test]
    fn counted_fraction_capped_at_two_decimals() {
        let gin = item(Category::Spirits, "28", Some("70cl"));
        assert!(validate_counted_units(&gin, 5, dec("0.75")).is_ok());
        assert!(validate_counted_units(&gin, 5, dec("0.755")).is_err());
    }

    #[test]
    fn counted_units_cannot_be_negative() {
        let keg = item(Category::Draught, "88", Some("50L keg"));
        assert!(validate_counted_units(&keg, -1, dec("0")).is_err());
        assert!(validate_counted_units(&keg, 0, dec("-0.5")).is_err());
    }
}
