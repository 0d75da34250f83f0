//! Property-based integration tests for the snapshot diff engine.
//!
//! These tests verify that the classification and reconstruction laws hold
//! across randomly generated snapshot pairs, using the `proptest` crate.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use tradewatch_core::diff::{compute_diff, reconstruct, verify_reconstruction};
use tradewatch_core::positions::{InstrumentId, Position, Snapshot};

// =============================================================================
// Generators
// =============================================================================

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 4, minute, 0).unwrap()
}

/// Generates a position from a small symbol universe so pairs overlap often.
fn arb_position() -> impl Strategy<Value = Position> {
    (
        prop_oneof![
            Just("AAPL"),
            Just("MSFT"),
            Just("GOOG"),
            Just("TSLA"),
            Just("NFLX"),
            Just("NIFTY24MAR22000CE"),
        ],
        proptest::option::of(prop_oneof![Just("NRML"), Just("MIS")]),
        -500i64..500,
        1i64..5_000_000, // average price in 1/10000ths
        -100_000i64..100_000,
    )
        .prop_map(|(symbol, product, quantity, price, pnl)| {
            let mut position = Position::new(
                symbol,
                product.map(str::to_string),
                quantity,
                Decimal::new(price, 4),
            );
            position.unrealized_pnl = Decimal::new(pnl, 2);
            position
        })
}

/// Generates a snapshot with unique instrument ids.
fn arb_snapshot(minute: u32) -> impl Strategy<Value = Snapshot> {
    proptest::collection::vec(arb_position(), 0..12).prop_map(move |positions| {
        let unique: BTreeMap<InstrumentId, Position> = positions
            .into_iter()
            .map(|p| (p.instrument_id.clone(), p))
            .collect();
        Snapshot::new("trader-one", at(minute), unique.into_values().collect()).unwrap()
    })
}

/// Generates a (previous, current) pair where current is derived from
/// previous by random edits, so modified entries are common.
fn arb_snapshot_pair() -> impl Strategy<Value = (Snapshot, Snapshot)> {
    (arb_snapshot(0), arb_snapshot(1), any::<u64>()).prop_map(|(previous, extra, seed)| {
        let mut positions: Vec<Position> = Vec::new();
        for (index, position) in previous.positions().values().enumerate() {
            let mut position = position.clone();
            match (seed >> (index % 60)) & 0b11 {
                0 => continue,
                1 => position.quantity += 1,
                2 => position.average_price += Decimal::new(5, 2),
                _ => {}
            }
            positions.push(position);
        }
        for position in extra.positions().values() {
            if !positions.iter().any(|p| p.instrument_id == position.instrument_id) {
                positions.push(position.clone());
            }
        }
        let current = Snapshot::new("trader-one", at(1), positions).unwrap();
        (previous, current)
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Applying the diff of (previous, current) to previous yields current.
    #[test]
    fn prop_reconstruction_round_trip((previous, current) in arb_snapshot_pair()) {
        let diff = compute_diff(&previous, &current).unwrap();
        let rebuilt = reconstruct(&previous, &diff).unwrap();

        prop_assert!(rebuilt.is_content_equal(&current));
        prop_assert!(verify_reconstruction(&previous, &diff, &current).is_ok());
    }

    /// Diffing a snapshot against itself is a no-op.
    #[test]
    fn prop_self_diff_is_empty(snapshot in arb_snapshot(0)) {
        let diff = compute_diff(&snapshot, &snapshot).unwrap();
        prop_assert!(diff.is_empty());
    }

    /// Identical inputs serialize to identical bytes.
    #[test]
    fn prop_diff_is_deterministic((previous, current) in arb_snapshot_pair()) {
        let first = serde_json::to_string(&compute_diff(&previous, &current).unwrap()).unwrap();
        let second = serde_json::to_string(&compute_diff(&previous, &current).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Added, removed and modified are disjoint, sorted, and together with
    /// the unchanged positions cover the union of both key sets.
    #[test]
    fn prop_diff_partitions_instruments((previous, current) in arb_snapshot_pair()) {
        let diff = compute_diff(&previous, &current).unwrap();

        let added: Vec<&InstrumentId> = diff.added_ids();
        let removed: Vec<&InstrumentId> = diff.removed_ids();
        let modified: Vec<&InstrumentId> = diff.modified_ids();

        for list in [&added, &removed, &modified] {
            let mut sorted = list.clone();
            sorted.sort();
            prop_assert_eq!(&sorted, list);
        }

        let added_set: HashSet<&InstrumentId> = added.iter().copied().collect();
        let removed_set: HashSet<&InstrumentId> = removed.iter().copied().collect();
        let modified_set: HashSet<&InstrumentId> = modified.iter().copied().collect();
        prop_assert!(added_set.is_disjoint(&removed_set));
        prop_assert!(added_set.is_disjoint(&modified_set));
        prop_assert!(removed_set.is_disjoint(&modified_set));

        for id in current.positions().keys() {
            let unchanged = previous
                .get(id)
                .is_some_and(|p| current.get(id).is_some_and(|c| p.is_same_holding(c)));
            prop_assert_eq!(
                added_set.contains(id) || modified_set.contains(id) || unchanged,
                true
            );
            prop_assert_eq!(added_set.contains(id), !previous.contains(id));
        }
        for id in previous.positions().keys() {
            prop_assert_eq!(removed_set.contains(id), !current.contains(id));
        }
    }

    /// P&L alone never produces a modification.
    #[test]
    fn prop_pnl_changes_are_ignored(snapshot in arb_snapshot(0), shift in -10_000i64..10_000) {
        let repriced: Vec<Position> = snapshot
            .positions()
            .values()
            .cloned()
            .map(|mut p| {
                p.unrealized_pnl += Decimal::new(shift, 2);
                p.booked_pnl -= Decimal::new(shift, 2);
                p
            })
            .collect();
        let current = Snapshot::new("trader-one", at(1), repriced).unwrap();

        prop_assert!(compute_diff(&snapshot, &current).unwrap().is_empty());
    }
}
