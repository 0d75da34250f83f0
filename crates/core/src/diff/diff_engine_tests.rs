//! Tests for diff classification.

#[cfg(test)]
mod tests {
    use crate::diff::{compute_diff, ChangeRecord, Diff};
    use crate::errors::{Error, ValidationError};
    use crate::positions::{InstrumentId, Position, Snapshot};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 4, minute, 0).unwrap()
    }

    fn snapshot(minute: u32, positions: &[(&str, i64, Decimal)]) -> Snapshot {
        Snapshot::new(
            "trader-one",
            at(minute),
            positions
                .iter()
                .map(|(symbol, qty, price)| Position::new(*symbol, None, *qty, *price))
                .collect(),
        )
        .unwrap()
    }

    fn ids(list: Vec<&InstrumentId>) -> Vec<&str> {
        list.into_iter().map(|id| id.as_str()).collect()
    }

    #[test]
    fn test_quantity_increase_and_new_position() {
        let previous = snapshot(0, &[("AAPL", 10, dec!(150))]);
        let current = snapshot(1, &[("AAPL", 15, dec!(150)), ("MSFT", 5, dec!(300))]);

        let diff = compute_diff(&previous, &current).unwrap();

        assert_eq!(ids(diff.added_ids()), vec!["MSFT"]);
        assert!(diff.removed.is_empty());
        assert_eq!(ids(diff.modified_ids()), vec!["AAPL"]);
        let aapl = &diff.modified[0];
        assert_eq!(aapl.previous.quantity, 10);
        assert_eq!(aapl.current.quantity, 15);
        assert_eq!(aapl.quantity_change, 5);
    }

    #[test]
    fn test_empty_previous_adds_everything() {
        let previous = snapshot(0, &[]);
        let current = snapshot(1, &[("TSLA", 2, dec!(700))]);

        let diff = compute_diff(&previous, &current).unwrap();

        assert_eq!(ids(diff.added_ids()), vec!["TSLA"]);
        assert!(diff.removed.is_empty());
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn test_identical_snapshots_give_no_op() {
        let previous = snapshot(0, &[("GOOG", 3, dec!(2800))]);
        let current = snapshot(1, &[("GOOG", 3, dec!(2800))]);

        let diff = compute_diff(&previous, &current).unwrap();

        assert!(diff.is_empty());
        assert_eq!(diff, Diff::default());
        assert_eq!(diff.change_count(), 0);
    }

    #[test]
    fn test_closed_position_is_removed() {
        let previous = snapshot(0, &[("NFLX", 1, dec!(400))]);
        let current = snapshot(1, &[]);

        let diff = compute_diff(&previous, &current).unwrap();

        assert!(diff.added.is_empty());
        assert_eq!(ids(diff.removed_ids()), vec!["NFLX"]);
        assert!(diff.modified.is_empty());
    }

    #[test]
    fn test_price_change_beyond_tolerance_is_modified() {
        let previous = snapshot(0, &[("AAPL", 10, dec!(150))]);
        let current = snapshot(1, &[("AAPL", 10, dec!(151.5))]);

        let diff = compute_diff(&previous, &current).unwrap();

        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].quantity_change, 0);
    }

    #[test]
    fn test_price_noise_within_tolerance_is_ignored() {
        let previous = snapshot(0, &[("AAPL", 10, dec!(150))]);
        let current = snapshot(1, &[("AAPL", 10, dec!(150.00009))]);

        assert!(compute_diff(&previous, &current).unwrap().is_empty());
    }

    #[test]
    fn test_pnl_changes_are_not_modifications() {
        let previous = snapshot(0, &[("AAPL", 10, dec!(150))]);
        let mut moved = Position::new("AAPL", None, 10, dec!(150));
        moved.unrealized_pnl = dec!(420);
        moved.last_price = Some(dec!(192));
        let current = Snapshot::new("trader-one", at(1), vec![moved]).unwrap();

        assert!(compute_diff(&previous, &current).unwrap().is_empty());
    }

    #[test]
    fn test_short_flip_is_modified() {
        let previous = snapshot(0, &[("NIFTYFUT", 50, dec!(22000))]);
        let current = snapshot(1, &[("NIFTYFUT", -50, dec!(22000))]);

        let diff = compute_diff(&previous, &current).unwrap();
        assert_eq!(diff.modified[0].quantity_change, -100);
    }

    #[test]
    fn test_profile_mismatch_is_rejected() {
        let previous = snapshot(0, &[]);
        let current = Snapshot::empty("someone-else", at(1));

        match compute_diff(&previous, &current) {
            Err(Error::Validation(ValidationError::ProfileMismatch { previous, current })) => {
                assert_eq!(previous, "trader-one");
                assert_eq!(current, "someone-else");
            }
            other => panic!("expected profile mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_output_lists_are_sorted_by_instrument() {
        let previous = snapshot(0, &[("ZOMATO", 1, dec!(1)), ("BHEL", 1, dec!(1))]);
        let current = snapshot(1, &[("YESBANK", 1, dec!(1)), ("ACC", 1, dec!(1))]);

        let diff = compute_diff(&previous, &current).unwrap();
        assert_eq!(ids(diff.added_ids()), vec!["ACC", "YESBANK"]);
        assert_eq!(ids(diff.removed_ids()), vec!["BHEL", "ZOMATO"]);
    }

    #[test]
    fn test_diff_serializes_deterministically() {
        let previous = snapshot(0, &[("AAPL", 10, dec!(150)), ("NFLX", 1, dec!(400))]);
        let current = snapshot(1, &[("AAPL", 15, dec!(150)), ("MSFT", 5, dec!(300))]);

        let first = serde_json::to_string(&compute_diff(&previous, &current).unwrap()).unwrap();
        let second = serde_json::to_string(&compute_diff(&previous, &current).unwrap()).unwrap();
        assert_eq!(first, second);

        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert!(value["added"].is_array());
        assert!(value["removed"].is_array());
        assert_eq!(value["modified"][0]["previous"]["quantity"], 10);
        assert_eq!(value["modified"][0]["current"]["quantity"], 15);
    }

    #[test]
    fn test_change_record_identity_and_summary() {
        let previous = snapshot(0, &[("AAPL", 10, dec!(150))]);
        let current = snapshot(1, &[("AAPL", 15, dec!(150)), ("MSFT", 5, dec!(300))]);
        let diff = compute_diff(&previous, &current).unwrap();

        let record = ChangeRecord::new("trader-one", Some(at(0)), at(1), diff.clone());
        let retried = ChangeRecord::new("trader-one", Some(at(0)), at(1), diff);
        assert_eq!(record, retried);
        assert_eq!(record.id, "trader-one_2024-03-04T04:01:00.000000Z");
        assert!(!record.is_initial());
        assert!(!record.is_no_op());
        assert_eq!(record.summary(), "Positions Added (1), Positions Modified (1)");

        let initial = ChangeRecord::new("trader-one", None, at(0), Diff::default());
        assert!(initial.is_initial());
        assert_eq!(initial.summary(), "Initial Snapshot (0 positions)");

        let no_op = ChangeRecord::new("trader-one", Some(at(1)), at(2), Diff::default());
        assert_eq!(no_op.summary(), "No Change");
    }

    #[test]
    fn test_extreme_quantity_swing_does_not_overflow() {
        let previous = snapshot(0, &[("NIFTY", i64::MIN, dec!(1))]);
        let current = snapshot(1, &[("NIFTY", i64::MAX, dec!(1))]);

        let diff = compute_diff(&previous, &current).unwrap();
        assert_eq!(
            diff.modified[0].quantity_change,
            i128::from(i64::MAX) - i128::from(i64::MIN)
        );
    }
}
