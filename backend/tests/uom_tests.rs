//! Unit-of-measure conversion tests
//!
//! Covers the display/servings round trip for every category style plus the
//! category-specific rounding rules.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use chrono::Utc;
use shared::models::{Category, Item};
use shared::uom::{to_display, to_servings, to_signed_display, DisplayUnits, UnitStyle};
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(category: Category, uom: &str, size: Option<&str>) -> Item {
    Item {
        id: Uuid::new_v4(),
        sku: format!("{}-TEST", category),
        name: format!("{} test item", category),
        category,
        size: size.map(str::to_string),
        uom: dec(uom),
        unit_cost: dec("2.50"),
        menu_price: dec("5.00"),
        is_active: true,
        created_at: Utc::now(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Draught keg: 46.75 pints displays as (0 kegs, 46.75 pints)
    #[test]
    fn test_draught_display() {
        let keg = item(Category::Draught, "88", Some("50L keg"));
        let display = to_display(dec("46.75"), &keg).unwrap();
        assert_eq!(display.full, 0);
        assert_eq!(display.partial, dec("46.75"));
    }

    /// Draught keg: 199.75 pints is 2 kegs and 23.75 pints
    #[test]
    fn test_draught_display_multiple_kegs() {
        let keg = item(Category::Draught, "88", Some("50L keg"));
        let display = to_display(dec("199.75"), &keg).unwrap();
        assert_eq!(display.full, 2);
        assert_eq!(display.partial, dec("23.75"));
    }

    /// Bottled beer: 6 cases and 5 loose bottles of a dozen is 77 servings
    #[test]
    fn test_bottled_beer_to_servings() {
        let beer = item(Category::BottledBeer, "12", None);
        let servings = to_servings(6, dec("5"), &beer).unwrap();
        assert_eq!(servings, dec("77"));
    }

    /// Spirits: (5 bottles, 0.75 of a bottle) at 28 shots/bottle is 161 shots
    #[test]
    fn test_spirits_fraction_to_servings() {
        let gin = item(Category::Spirits, "28", Some("70cl"));
        let servings = to_servings(5, dec("0.75"), &gin).unwrap();
        assert_eq!(servings, dec("161"));
    }

    /// Spirits: 87 shots displays as (3 bottles, 0.11 of a bottle)
    #[test]
    fn test_spirits_display_rounding() {
        let gin = item(Category::Spirits, "28", Some("70cl"));
        let display = to_display(dec("87"), &gin).unwrap();
        assert_eq!(display.full, 3);
        assert_eq!(display.partial, dec("0.11"));
    }

    /// Minerals with a dozen size count like bottled beer
    #[test]
    fn test_minerals_dozen_style() {
        let tonic = item(Category::Minerals, "12", Some("dozen 200ml"));
        assert_eq!(tonic.unit_style(), UnitStyle::CaseAndBottles);
        let servings = to_servings(2, dec("3"), &tonic).unwrap();
        assert_eq!(servings, dec("27"));
    }

    /// Minerals without a dozen size fall back to bottle-and-fraction
    #[test]
    fn test_minerals_single_style() {
        let cordial = item(Category::Minerals, "32", Some("1L"));
        assert_eq!(cordial.unit_style(), UnitStyle::BottleAndFraction);
        let servings = to_servings(1, dec("0.50"), &cordial).unwrap();
        assert_eq!(servings, dec("48"));
    }

    /// Zero servings displays as (0, 0)
    #[test]
    fn test_zero_servings() {
        let keg = item(Category::Draught, "88", Some("50L keg"));
        assert_eq!(to_display(Decimal::ZERO, &keg).unwrap(), DisplayUnits::ZERO);
    }

    /// Rounding a loose-bottle remainder up to a whole case carries
    #[test]
    fn test_case_rounding_carries() {
        let beer = item(Category::BottledBeer, "12", None);
        // 2 cases plus 11.6 bottles rounds to a third case
        let display = to_display(dec("35.6"), &beer).unwrap();
        assert_eq!(display.full, 3);
        assert_eq!(display.partial, Decimal::ZERO);
    }

    /// Half-up rounding on loose bottles
    #[test]
    fn test_bottle_rounding_half_up() {
        let beer = item(Category::BottledBeer, "12", None);
        let display = to_display(dec("26.5"), &beer).unwrap();
        assert_eq!(display.full, 2);
        assert_eq!(display.partial, dec("3"));
    }

    /// Negative servings are not valid converter input
    #[test]
    fn test_negative_servings_rejected() {
        let keg = item(Category::Draught, "88", Some("50L keg"));
        assert!(to_display(dec("-1"), &keg).is_err());
        assert!(to_servings(-1, Decimal::ZERO, &keg).is_err());
        assert!(to_servings(0, dec("-0.5"), &keg).is_err());
    }

    /// Signed display carries the sign onto both components
    #[test]
    fn test_signed_display() {
        let keg = item(Category::Draught, "88", Some("50L keg"));
        let display = to_signed_display(dec("-90.25"), &keg).unwrap();
        assert_eq!(display.full, -1);
        assert_eq!(display.partial, dec("-2.25"));

        // A sub-keg shortage keeps its sign on the partial component
        let display = to_signed_display(dec("-3.25"), &keg).unwrap();
        assert_eq!(display.full, 0);
        assert_eq!(display.partial, dec("-3.25"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Round-trip: cases and loose bottles survive display conversion
        #[test]
        fn prop_case_and_bottles_round_trip(full in 0i64..200, partial in 0i64..12) {
            let beer = item(Category::BottledBeer, "12", None);
            let partial = Decimal::from(partial);
            let servings = to_servings(full, partial, &beer).unwrap();
            let display = to_display(servings, &beer).unwrap();
            prop_assert_eq!(display.full, full);
            prop_assert_eq!(display.partial, partial);
        }

        /// Round-trip: kegs and two-decimal pints survive display conversion
        #[test]
        fn prop_keg_and_pints_round_trip(full in 0i64..50, cents in 0i64..8800) {
            let keg = item(Category::Draught, "88", Some("50L keg"));
            let partial = Decimal::new(cents, 2); // 0.00 to 87.99 pints
            let servings = to_servings(full, partial, &keg).unwrap();
            let display = to_display(servings, &keg).unwrap();
            prop_assert_eq!(display.full, full);
            prop_assert_eq!(display.partial, partial);
        }

        /// Round-trip: bottles and a two-decimal fraction survive display
        #[test]
        fn prop_bottle_and_fraction_round_trip(full in 0i64..100, cents in 0i64..100) {
            let gin = item(Category::Spirits, "28", Some("70cl"));
            let partial = Decimal::new(cents, 2); // 0.00 to 0.99
            let servings = to_servings(full, partial, &gin).unwrap();
            let display = to_display(servings, &gin).unwrap();
            prop_assert_eq!(display.full, full);
            prop_assert_eq!(display.partial, partial);
        }

        /// Display partial always stays below one full unit
        #[test]
        fn prop_partial_below_unit(servings_cents in 0i64..1_000_000) {
            let keg = item(Category::Draught, "88", Some("50L keg"));
            let servings = Decimal::new(servings_cents, 2);
            let display = to_display(servings, &keg).unwrap();
            prop_assert!(display.partial >= Decimal::ZERO);
            prop_assert!(display.partial < keg.uom);
        }

        /// Fractional partial stays in [0, 1) for spirits
        #[test]
        fn prop_fraction_in_unit_interval(servings_cents in 0i64..1_000_000) {
            let gin = item(Category::Spirits, "28", Some("70cl"));
            let servings = Decimal::new(servings_cents, 2);
            let display = to_display(servings, &gin).unwrap();
            prop_assert!(display.partial >= Decimal::ZERO);
            prop_assert!(display.partial < Decimal::ONE);
        }
    }
}
