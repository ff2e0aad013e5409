//! Stocktake lifecycle model tests
//!
//! Covers the editability gate, count completeness and status parsing that
//! back the approval workflow.

use rust_decimal::Decimal;
use std::str::FromStr;

use chrono::Utc;
use shared::models::{
    check_ready_for_approval, ApprovalGap, CountedUnits, Stocktake, StocktakeLine, StocktakeStatus,
};
use uuid::Uuid;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn stocktake(status: StocktakeStatus, is_locked: bool) -> Stocktake {
    Stocktake {
        id: Uuid::new_v4(),
        period_id: Uuid::new_v4(),
        status,
        is_locked,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn line(counted: Option<(i64, &str)>) -> StocktakeLine {
    let (full, partial) = match counted {
        Some((full, partial)) => (Some(full), Some(dec(partial))),
        None => (None, None),
    };
    StocktakeLine {
        id: Uuid::new_v4(),
        stocktake_id: Uuid::new_v4(),
        item_id: Uuid::new_v4(),
        opening_qty: dec("77"),
        purchases: Decimal::ZERO,
        sales: Decimal::ZERO,
        waste: Decimal::ZERO,
        transfers_in: Decimal::ZERO,
        transfers_out: Decimal::ZERO,
        adjustments: Decimal::ZERO,
        counted_full_units: full,
        counted_partial_units: partial,
        expected_qty: dec("77"),
        expected_value: dec("138.60"),
        counted_qty: None,
        counted_value: None,
        variance_qty: None,
        variance_value: None,
        updated_at: Utc::now(),
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Only an unlocked draft accepts edits
    #[test]
    fn test_editability_gate() {
        assert!(stocktake(StocktakeStatus::Draft, false).is_editable());
        assert!(!stocktake(StocktakeStatus::Draft, true).is_editable());
        assert!(!stocktake(StocktakeStatus::Approved, false).is_editable());
        assert!(!stocktake(StocktakeStatus::Approved, true).is_editable());
    }

    /// Status strings round-trip through parse
    #[test]
    fn test_status_round_trip() {
        assert_eq!(
            StocktakeStatus::parse(StocktakeStatus::Draft.as_str()),
            Some(StocktakeStatus::Draft)
        );
        assert_eq!(
            StocktakeStatus::parse(StocktakeStatus::Approved.as_str()),
            Some(StocktakeStatus::Approved)
        );
        assert_eq!(StocktakeStatus::parse("cancelled"), None);
    }

    /// A line is counted only once both components are present
    #[test]
    fn test_line_completeness() {
        assert!(!line(None).is_counted());
        assert!(line(Some((6, "5"))).is_counted());
        // A count of zero on hand is still a count
        assert!(line(Some((0, "0"))).is_counted());
    }

    /// Counted units are only surfaced as a pair
    #[test]
    fn test_counted_units_pairing() {
        assert_eq!(line(None).counted_units(), None);
        assert_eq!(
            line(Some((6, "5"))).counted_units(),
            Some(CountedUnits {
                full: 6,
                partial: dec("5"),
            })
        );
    }

    /// Approval requires every line counted; one missing count blocks it
    /// and names the offending item
    #[test]
    fn test_uncounted_lines_block_approval() {
        let missing = line(None);
        let missing_item = missing.item_id;
        let lines = vec![line(Some((2, "3"))), missing, line(Some((0, "0")))];

        assert_eq!(
            check_ready_for_approval(&lines),
            Err(ApprovalGap::Uncounted(vec![missing_item]))
        );
    }

    /// A stocktake with no lines at all must not be approvable; closing the
    /// period without snapshots would zero every next-period opening
    #[test]
    fn test_empty_stocktake_blocks_approval() {
        assert_eq!(check_ready_for_approval(&[]), Err(ApprovalGap::NoLines));
    }

    /// Fully counted lines clear the approval check
    #[test]
    fn test_counted_lines_ready_for_approval() {
        let lines = vec![line(Some((2, "3"))), line(Some((0, "0")))];
        assert_eq!(check_ready_for_approval(&lines), Ok(()));
    }

    /// Snapshot values only come from a fully derived line; a counted pair
    /// with missing derived columns is surfaced, never defaulted to zero
    #[test]
    fn test_counted_snapshot_requires_derived_values() {
        let mut counted = line(Some((6, "5")));
        assert_eq!(counted.counted_snapshot(), None);

        counted.counted_qty = Some(dec("77"));
        assert_eq!(counted.counted_snapshot(), None);

        counted.counted_value = Some(dec("138.60"));
        let (units, qty, value) = counted.counted_snapshot().unwrap();
        assert_eq!(units.full, 6);
        assert_eq!(units.partial, dec("5"));
        assert_eq!(qty, dec("77"));
        assert_eq!(value, dec("138.60"));

        assert_eq!(line(None).counted_snapshot(), None);
    }
}
