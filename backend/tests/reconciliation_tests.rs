//! Reconciliation engine tests
//!
//! Exercises the pure line recomputation: the expected-stock formula,
//! variance derivation, valuation, display decomposition and totals.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use chrono::Utc;
use shared::models::{Category, CountedUnits, Item, MovementSums, MovementType};
use shared::recompute::{line_display, recompute_line, total_values};
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(category: Category, uom: &str, unit_cost: &str, size: Option<&str>) -> Item {
    Item {
        id: Uuid::new_v4(),
        sku: format!("{}-TEST", category),
        name: format!("{} test item", category),
        category,
        size: size.map(str::to_string),
        uom: dec(uom),
        unit_cost: dec(unit_cost),
        menu_price: dec("5.00"),
        is_active: true,
        created_at: Utc::now(),
    }
}

fn sums(purchases: &str, sales: &str, waste: &str) -> MovementSums {
    MovementSums {
        purchases: dec(purchases),
        sales: dec(sales),
        waste: dec(waste),
        ..MovementSums::default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Draught line over a busy fortnight: opening 199.75 pints, two kegs
    /// delivered, 325.75 sold and 3.25 wasted leaves 46.75 expected.
    #[test]
    fn test_draught_expected_stock() {
        let keg = item(Category::Draught, "88", "2.10", Some("50L keg"));
        let derived = recompute_line(&keg, dec("199.75"), &sums("176", "325.75", "3.25"), None)
            .unwrap();

        assert_eq!(derived.expected_qty, dec("46.75"));
        assert_eq!(derived.expected_value, dec("46.75") * dec("2.10"));
        assert!(derived.counted_qty.is_none());
        assert!(derived.variance_qty.is_none());

        let display = line_display(&keg, dec("199.75"), &derived).unwrap();
        assert_eq!(display.expected.full, 0);
        assert_eq!(display.expected.partial, dec("46.75"));
        assert_eq!(display.opening.full, 2);
        assert_eq!(display.opening.partial, dec("23.75"));
    }

    /// Spirits line: opening (5, 0.75) at 28 shots/bottle, one bottle
    /// delivered, 156 shots sold and 2 wasted leaves 87 expected, shown
    /// as (3 bottles, 0.11 of a bottle).
    #[test]
    fn test_spirits_expected_display() {
        let gin = item(Category::Spirits, "28", "1.45", Some("70cl"));
        let opening = dec("161"); // (5, 0.75) converted to shots
        let derived = recompute_line(&gin, opening, &sums("28", "156", "2"), None).unwrap();

        assert_eq!(derived.expected_qty, dec("31"));

        let display = line_display(&gin, opening, &derived).unwrap();
        assert_eq!(display.expected.full, 1);
        assert_eq!(display.expected.partial, dec("0.11"));
    }

    /// All six movement buckets contribute with the documented sign
    #[test]
    fn test_all_buckets_contribute() {
        let beer = item(Category::BottledBeer, "12", "1.80", None);
        let sums = MovementSums {
            purchases: dec("48"),
            sales: dec("30"),
            waste: dec("2"),
            transfers_in: dec("12"),
            transfers_out: dec("6"),
            adjustments: dec("-3"),
        };
        let derived = recompute_line(&beer, dec("77"), &sums, None).unwrap();
        // 77 + 48 + 12 - 30 - 2 - 6 + (-3)
        assert_eq!(derived.expected_qty, dec("96"));
    }

    /// Entering a count produces counted and variance values
    #[test]
    fn test_counted_variance() {
        let keg = item(Category::Draught, "88", "2.10", Some("50L keg"));
        let counted = CountedUnits {
            full: 0,
            partial: dec("44.50"),
        };
        let derived = recompute_line(
            &keg,
            dec("199.75"),
            &sums("176", "325.75", "3.25"),
            Some(counted),
        )
        .unwrap();

        assert_eq!(derived.counted_qty, Some(dec("44.50")));
        assert_eq!(derived.variance_qty, Some(dec("-2.25")));
        assert_eq!(derived.variance_value, Some(dec("-2.25") * dec("2.10")));

        let display = line_display(&keg, dec("199.75"), &derived).unwrap();
        let variance = display.variance.unwrap();
        assert_eq!(variance.full, 0);
        assert_eq!(variance.partial, dec("-2.25"));
    }

    /// A surplus count yields a positive variance
    #[test]
    fn test_surplus_variance() {
        let beer = item(Category::BottledBeer, "12", "1.80", None);
        let counted = CountedUnits {
            full: 8,
            partial: dec("2"),
        };
        let derived =
            recompute_line(&beer, dec("77"), &sums("24", "6", "0"), Some(counted)).unwrap();
        assert_eq!(derived.expected_qty, dec("95"));
        assert_eq!(derived.counted_qty, Some(dec("98")));
        assert_eq!(derived.variance_qty, Some(dec("3")));
    }

    /// Over-recorded sales drive expected stock negative; the value is
    /// surfaced as-is rather than clamped to zero.
    #[test]
    fn test_negative_expected_passes_through() {
        let gin = item(Category::Spirits, "28", "1.45", Some("70cl"));
        let derived = recompute_line(&gin, dec("10"), &sums("0", "38", "0"), None).unwrap();
        assert_eq!(derived.expected_qty, dec("-28"));
        assert_eq!(derived.expected_value, dec("-28") * dec("1.45"));

        let display = line_display(&gin, dec("10"), &derived).unwrap();
        assert_eq!(display.expected.full, -1);
        assert_eq!(display.expected.partial, Decimal::ZERO);
    }

    /// Totals roll counted and variance values up, skipping uncounted lines
    #[test]
    fn test_totals_skip_uncounted() {
        let keg = item(Category::Draught, "88", "2.00", Some("50L keg"));
        let counted = recompute_line(
            &keg,
            dec("100"),
            &sums("0", "20", "0"),
            Some(CountedUnits {
                full: 0,
                partial: dec("75"),
            }),
        )
        .unwrap();
        let uncounted = recompute_line(&keg, dec("50"), &sums("0", "10", "0"), None).unwrap();

        let totals = total_values([&counted, &uncounted]);
        assert_eq!(totals.expected_value, dec("240")); // (80 + 40) * 2.00
        assert_eq!(totals.counted_value, dec("150"));
        assert_eq!(totals.variance_value, dec("-10"));
    }

    /// An invalid counted pair propagates as an error, not a silent zero
    #[test]
    fn test_invalid_count_rejected() {
        let keg = item(Category::Draught, "88", "2.00", Some("50L keg"));
        let counted = CountedUnits {
            full: -1,
            partial: Decimal::ZERO,
        };
        let result = recompute_line(&keg, dec("100"), &MovementSums::default(), Some(counted));
        assert!(result.is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn movement_type() -> impl Strategy<Value = MovementType> {
        prop_oneof![
            Just(MovementType::Purchase),
            Just(MovementType::Sale),
            Just(MovementType::Waste),
            Just(MovementType::TransferIn),
            Just(MovementType::TransferOut),
            Just(MovementType::Adjustment),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Recomputation is deterministic: same inputs, same output
        #[test]
        fn prop_recompute_idempotent(
            opening_cents in 0i64..100_000,
            purchases in 0i64..1000,
            sales in 0i64..1000,
            full in 0i64..20,
            partial_cents in 0i64..8800,
        ) {
            let keg = item(Category::Draught, "88", "2.10", Some("50L keg"));
            let opening = Decimal::new(opening_cents, 2);
            let sums = sums(&purchases.to_string(), &sales.to_string(), "0");
            let counted = CountedUnits { full, partial: Decimal::new(partial_cents, 2) };

            let first = recompute_line(&keg, opening, &sums, Some(counted)).unwrap();
            let second = recompute_line(&keg, opening, &sums, Some(counted)).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Expected stock equals opening plus each movement's signed
        /// contribution, independent of the order they were recorded in
        #[test]
        fn prop_movements_sum_order_independent(
            opening in 0i64..10_000,
            movements in prop::collection::vec((movement_type(), 1i64..500), 0..20),
        ) {
            let beer = item(Category::BottledBeer, "12", "1.80", None);
            let opening = Decimal::from(opening);

            let mut forward = MovementSums::default();
            for (mt, qty) in &movements {
                forward.add(*mt, Decimal::from(*qty));
            }
            let mut reverse = MovementSums::default();
            for (mt, qty) in movements.iter().rev() {
                reverse.add(*mt, Decimal::from(*qty));
            }

            let a = recompute_line(&beer, opening, &forward, None).unwrap();
            let b = recompute_line(&beer, opening, &reverse, None).unwrap();
            prop_assert_eq!(a.expected_qty, b.expected_qty);

            let by_sign: Decimal = movements
                .iter()
                .map(|(mt, qty)| mt.sign() * Decimal::from(*qty))
                .sum();
            prop_assert_eq!(a.expected_qty, opening + by_sign);
        }

        /// Value columns are always quantity times unit cost
        #[test]
        fn prop_values_track_quantities(
            opening in 0i64..10_000,
            sales in 0i64..10_000,
            full in 0i64..50,
            partial in 0i64..12,
            cost_cents in 1i64..10_000,
        ) {
            let mut beer = item(Category::BottledBeer, "12", "1.80", None);
            beer.unit_cost = Decimal::new(cost_cents, 2);
            let counted = CountedUnits { full, partial: Decimal::from(partial) };

            let derived = recompute_line(
                &beer,
                Decimal::from(opening),
                &sums("0", &sales.to_string(), "0"),
                Some(counted),
            )
            .unwrap();

            prop_assert_eq!(derived.expected_value, derived.expected_qty * beer.unit_cost);
            prop_assert_eq!(
                derived.counted_value.unwrap(),
                derived.counted_qty.unwrap() * beer.unit_cost
            );
            prop_assert_eq!(
                derived.variance_value.unwrap(),
                derived.variance_qty.unwrap() * beer.unit_cost
            );
            prop_assert_eq!(
                derived.variance_qty.unwrap(),
                derived.counted_qty.unwrap() - derived.expected_qty
            );
        }
    }
}
