//! Tests for the capture cycle.

#[cfg(test)]
mod tests {
    use crate::capture::{CaptureOutcome, CaptureService};
    use crate::changelog::ChangeRecordRepositoryTrait;
    use crate::diff::change_record_id;
    use crate::positions::{RawTrade, SnapshotRepositoryTrait};
    use crate::test_support::{raw_snapshot, raw_trade, utc, Fixture};
    use chrono::{DateTime, Utc};
    use std::sync::Arc;

    // 2024-03-04 is a Monday. 04:30 UTC is 10:00 in Kolkata.
    fn open(minute: u32) -> DateTime<Utc> {
        utc(2024, 3, 4, 4, 30 + minute, 0)
    }

    fn after_close() -> DateTime<Utc> {
        utc(2024, 3, 4, 12, 0, 0)
    }

    fn service(fixture: &Fixture) -> CaptureService {
        CaptureService::new(
            fixture.source.clone(),
            fixture.snapshots.clone(),
            fixture.changes.clone(),
        )
        .with_verification(true)
    }

    fn recorded(outcome: CaptureOutcome) -> crate::diff::ChangeRecord {
        match outcome {
            CaptureOutcome::Recorded(record) => record,
            other => panic!("expected a recorded capture, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_capture_records_initial_snapshot_outside_market_hours() {
        let fixture = Fixture::default();
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![raw_trade("AAPL", 10, 150.0)])),
        );
        let service = service(&fixture);

        let record = recorded(service.capture_profile("trader-one", after_close()).await.unwrap());

        assert!(record.is_initial());
        assert_eq!(record.diff.added.len(), 1);
        assert_eq!(record.summary(), "Initial Snapshot (1 positions)");
        assert_eq!(fixture.snapshots.count("trader-one"), 1);
    }

    #[tokio::test]
    async fn test_market_closed_skips_profiles_with_history() {
        let fixture = Fixture::default();
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![raw_trade("AAPL", 10, 150.0)])),
        );
        let service = service(&fixture);
        service.capture_profile("trader-one", open(0)).await.unwrap();

        let outcome = service
            .capture_profile("trader-one", after_close())
            .await
            .unwrap();

        assert_eq!(outcome, CaptureOutcome::MarketClosed);
        assert_eq!(fixture.source.calls(), 1);
        assert_eq!(fixture.snapshots.count("trader-one"), 1);
    }

    #[tokio::test]
    async fn test_consecutive_captures_chain_change_records() {
        let fixture = Fixture::default();
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![raw_trade("AAPL", 10, 150.0)])),
        );
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![
                raw_trade("AAPL", 15, 150.0),
                raw_trade("MSFT", 5, 300.0),
            ])),
        );
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![
                raw_trade("AAPL", 15, 150.0),
                raw_trade("MSFT", 5, 300.0),
            ])),
        );
        let service = service(&fixture);

        service.capture_profile("trader-one", open(0)).await.unwrap();
        let second = recorded(service.capture_profile("trader-one", open(1)).await.unwrap());
        let third = recorded(service.capture_profile("trader-one", open(2)).await.unwrap());

        assert_eq!(second.previous_at, Some(open(0)));
        assert_eq!(second.summary(), "Positions Added (1), Positions Modified (1)");
        assert_eq!(second.diff.modified[0].quantity_change, 5);

        assert_eq!(third.previous_at, Some(open(1)));
        assert!(third.is_no_op());

        // One record per snapshot, no-ops included.
        assert_eq!(fixture.changes.all_records().len(), 3);
        assert_eq!(fixture.snapshots.count("trader-one"), 3);
    }

    #[tokio::test]
    async fn test_no_data_persists_nothing() {
        let fixture = Fixture::default();
        fixture.source.push("trader-one", None);
        let service = service(&fixture);

        let outcome = service.capture_profile("trader-one", open(0)).await.unwrap();

        assert_eq!(outcome, CaptureOutcome::NoData);
        assert!(!fixture.snapshots.has_snapshots("trader-one").unwrap());
        assert!(fixture.changes.all_records().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_payload_is_recorded_as_failure() {
        let fixture = Fixture::default();
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![RawTrade {
                quantity: Some(serde_json::json!(3)),
                ..Default::default()
            }])),
        );
        let service = service(&fixture);

        let failure = service
            .capture_or_record_failure("trader-one", open(0))
            .await
            .unwrap_err();

        assert!(failure.reason.contains("trading_symbol"));
        assert_eq!(fixture.changes.all_failures(), vec![failure]);
        assert!(!fixture.snapshots.has_snapshots("trader-one").unwrap());
    }

    #[tokio::test]
    async fn test_capture_all_isolates_failing_profiles() {
        let fixture = Fixture::default();
        fixture.source.push_error("broken", "connection reset");
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![raw_trade("TSLA", 2, 700.0)])),
        );
        fixture.source.push("quiet", None);
        let service = service(&fixture);

        let profiles = vec![
            "broken".to_string(),
            "trader-one".to_string(),
            "quiet".to_string(),
        ];
        let report = service.capture_all(&profiles, open(0)).await;

        assert_eq!(report.recorded, 1);
        assert_eq!(report.changed, 1);
        assert_eq!(report.no_data, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].profile_id, "broken");
        assert!(report.failed[0].reason.contains("connection reset"));
        assert_eq!(fixture.snapshots.count("trader-one"), 1);
    }

    #[tokio::test]
    async fn test_lost_change_record_is_rebuilt_on_next_capture() {
        let fixture = Fixture::default();
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![raw_trade("AAPL", 10, 150.0)])),
        );
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![raw_trade("AAPL", 20, 150.0)])),
        );
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![raw_trade("AAPL", 20, 150.0)])),
        );
        let service = service(&fixture);
        service.capture_profile("trader-one", open(0)).await.unwrap();

        // Snapshot write succeeds, record write fails.
        fixture.changes.fail_record_writes(Some("disk full"));
        assert!(service.capture_profile("trader-one", open(1)).await.is_err());
        assert_eq!(fixture.snapshots.count("trader-one"), 2);
        assert_eq!(fixture.changes.all_records().len(), 1);

        fixture.changes.fail_record_writes(None);
        service.capture_profile("trader-one", open(2)).await.unwrap();

        let healed = fixture
            .changes
            .get_change_record(&change_record_id("trader-one", open(1)))
            .unwrap()
            .expect("rebuilt record");
        assert_eq!(healed.previous_at, Some(open(0)));
        assert_eq!(healed.diff.modified[0].quantity_change, 10);
        assert_eq!(fixture.changes.all_records().len(), 3);
    }

    #[tokio::test]
    async fn test_ingest_snapshot_diffs_against_latest_prior() {
        let fixture = Fixture::default();
        let service = Arc::new(service(&fixture));
        let first = crate::test_support::snapshot(
            "trader-one",
            open(0),
            vec![crate::test_support::position("NFLX", 1, "400")],
        );
        let second = crate::test_support::snapshot("trader-one", open(5), vec![]);

        service.ingest_snapshot(first).await.unwrap();
        let record = service.ingest_snapshot(second).await.unwrap();

        assert_eq!(record.diff.removed.len(), 1);
        assert_eq!(record.diff.removed[0].symbol, "NFLX");
        assert_eq!(record.summary(), "Positions Removed (1)");
    }

    #[tokio::test]
    async fn test_retried_capture_at_same_instant_is_idempotent() {
        let fixture = Fixture::default();
        fixture.source.push(
            "trader-one",
            Some(raw_snapshot(vec![raw_trade("AAPL", 10, 150.0)])),
        );
        let service = service(&fixture);

        let first = recorded(service.capture_profile("trader-one", open(0)).await.unwrap());
        let second = recorded(service.capture_profile("trader-one", open(0)).await.unwrap());

        assert_eq!(first, second);
        assert_eq!(fixture.snapshots.count("trader-one"), 1);
        assert_eq!(fixture.changes.all_records().len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_older_than_latest_is_rejected() {
        use crate::errors::{Error, ValidationError};
        use crate::test_support::{position, snapshot};

        let fixture = Fixture::default();
        let service = service(&fixture);
        let at = |minute| utc(2024, 3, 4, 4, minute, 0);

        service
            .ingest_snapshot(snapshot("trader-one", at(0), vec![position("AAPL", 1, "150")]))
            .await
            .unwrap();
        service
            .ingest_snapshot(snapshot("trader-one", at(10), vec![position("AAPL", 3, "150")]))
            .await
            .unwrap();

        let late = service
            .ingest_snapshot(snapshot("trader-one", at(5), vec![position("AAPL", 2, "150")]))
            .await;
        assert!(matches!(
            late,
            Err(Error::Validation(ValidationError::InvalidInput(_)))
        ));

        assert_eq!(fixture.snapshots.count("trader-one"), 2);
        let latest = fixture
            .changes
            .get_change_record(&change_record_id("trader-one", at(10)))
            .unwrap()
            .expect("record of the latest snapshot");
        assert_eq!(latest.previous_at, Some(at(0)));
        assert_eq!(latest.diff.modified[0].quantity_change, 2);
        assert_eq!(fixture.changes.all_records().len(), 2);
    }
}
