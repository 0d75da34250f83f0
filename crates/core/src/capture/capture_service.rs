//! One capture cycle: fetch, validate, diff against the prior snapshot,
//! persist snapshot and change record.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::PositionSourceTrait;
use crate::changelog::{CaptureFailure, ChangeRecordRepositoryTrait};
use crate::diff::{change_record_id, compute_diff, verify_reconstruction, ChangeRecord};
use crate::errors::{Result, ValidationError};
use crate::positions::{Snapshot, SnapshotRepositoryTrait};
use crate::utils::time_utils::{format_timestamp, MarketHours};

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// A snapshot and its change record were persisted.
    Recorded(ChangeRecord),
    /// The source returned nothing for the profile.
    NoData,
    /// The profile already has history and the market is closed.
    MarketClosed,
}

/// Result of one capture pass over several profiles.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureReport {
    pub recorded: usize,
    /// Recorded captures whose diff was not a no-op.
    pub changed: usize,
    pub no_data: usize,
    pub market_closed: usize,
    pub failed: Vec<CaptureFailure>,
}

pub struct CaptureService {
    source: Arc<dyn PositionSourceTrait>,
    snapshots: Arc<dyn SnapshotRepositoryTrait>,
    changes: Arc<dyn ChangeRecordRepositoryTrait>,
    market_hours: MarketHours,
    verify_diffs: bool,
    // One in-flight cycle per profile.
    profile_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CaptureService {
    pub fn new(
        source: Arc<dyn PositionSourceTrait>,
        snapshots: Arc<dyn SnapshotRepositoryTrait>,
        changes: Arc<dyn ChangeRecordRepositoryTrait>,
    ) -> Self {
        Self {
            source,
            snapshots,
            changes,
            market_hours: MarketHours::default(),
            verify_diffs: false,
            profile_locks: DashMap::new(),
        }
    }

    pub fn with_market_hours(mut self, market_hours: MarketHours) -> Self {
        self.market_hours = market_hours;
        self
    }

    /// Runs the reconstruction self-check on every computed diff.
    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_diffs = enabled;
        self
    }

    fn profile_lock(&self, profile_id: &str) -> Arc<Mutex<()>> {
        self.profile_locks
            .entry(profile_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Captures one profile at `now`.
    ///
    /// Profiles without history are captured at any time; others only while
    /// the market is open.
    pub async fn capture_profile(
        &self,
        profile_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CaptureOutcome> {
        let lock = self.profile_lock(profile_id);
        let _guard = lock.lock().await;

        if self.snapshots.has_snapshots(profile_id)? && !self.market_hours.is_open(now) {
            debug!("Market closed, skipping capture for {}", profile_id);
            return Ok(CaptureOutcome::MarketClosed);
        }

        let raw = match self.source.fetch_positions(profile_id).await? {
            Some(raw) => raw,
            None => {
                debug!("No position data for {}", profile_id);
                return Ok(CaptureOutcome::NoData);
            }
        };

        let current = Snapshot::from_raw(profile_id, now, &raw)?;
        let record = self.record_snapshot(current).await?;
        Ok(CaptureOutcome::Recorded(record))
    }

    /// Persists an already-built snapshot and its change record.
    pub async fn ingest_snapshot(&self, current: Snapshot) -> Result<ChangeRecord> {
        let lock = self.profile_lock(&current.profile_id);
        let _guard = lock.lock().await;
        self.record_snapshot(current).await
    }

    /// Like `capture_profile`, but a failure is also logged and persisted as
    /// a capture failure so the interval shows up in the timeline.
    pub async fn capture_or_record_failure(
        &self,
        profile_id: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<CaptureOutcome, CaptureFailure> {
        match self.capture_profile(profile_id, now).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!("Capture failed for {}: {}", profile_id, e);
                let failure = CaptureFailure::new(profile_id, now, e.to_string());
                if let Err(store_err) = self.changes.put_capture_failure(&failure).await {
                    error!(
                        "Failed to record capture failure for {}: {}",
                        profile_id, store_err
                    );
                }
                Err(failure)
            }
        }
    }

    /// Captures all given profiles concurrently. A failing profile never
    /// blocks the others.
    pub async fn capture_all(&self, profile_ids: &[String], now: DateTime<Utc>) -> CaptureReport {
        let results = join_all(
            profile_ids
                .iter()
                .map(|profile_id| self.capture_or_record_failure(profile_id, now)),
        )
        .await;

        let mut report = CaptureReport::default();
        for result in results {
            match result {
                Ok(CaptureOutcome::Recorded(record)) => {
                    report.recorded += 1;
                    if !record.is_no_op() {
                        report.changed += 1;
                    }
                }
                Ok(CaptureOutcome::NoData) => report.no_data += 1,
                Ok(CaptureOutcome::MarketClosed) => report.market_closed += 1,
                Err(failure) => report.failed.push(failure),
            }
        }

        info!(
            "Capture pass: {} recorded ({} changed), {} without data, {} skipped, {} failed",
            report.recorded,
            report.changed,
            report.no_data,
            report.market_closed,
            report.failed.len()
        );
        report
    }

    // Caller must hold the profile lock.
    async fn record_snapshot(&self, current: Snapshot) -> Result<ChangeRecord> {
        // Only appends keep one record per consecutive pair; an earlier
        // snapshot would leave its successor's record stale.
        if let Some(latest) = self.snapshots.get_latest_snapshot(&current.profile_id)? {
            if current.captured_at < latest.captured_at {
                return Err(ValidationError::InvalidInput(format!(
                    "snapshot for {} at {} is older than the latest one at {}",
                    current.profile_id,
                    format_timestamp(current.captured_at),
                    format_timestamp(latest.captured_at)
                ))
                .into());
            }
        }

        let previous = self
            .snapshots
            .get_latest_snapshot_before(&current.profile_id, current.captured_at)?;
        if let Some(previous) = previous.as_ref() {
            self.ensure_change_record(previous).await?;
        }

        let record = self.diff_against(previous.as_ref(), &current)?;
        self.snapshots.put_snapshot(&current).await?;
        self.changes.put_change_record(&record).await?;

        if !record.is_no_op() {
            info!("{}: {}", record.profile_id, record.summary());
        }
        Ok(record)
    }

    fn diff_against(&self, previous: Option<&Snapshot>, current: &Snapshot) -> Result<ChangeRecord> {
        let baseline = previous
            .cloned()
            .unwrap_or_else(|| Snapshot::empty(current.profile_id.clone(), current.captured_at));
        let diff = compute_diff(&baseline, current)?;
        if self.verify_diffs {
            verify_reconstruction(&baseline, &diff, current)?;
        }
        Ok(ChangeRecord::new(
            current.profile_id.clone(),
            previous.map(|p| p.captured_at),
            current.captured_at,
            diff,
        ))
    }

    /// Rebuilds the change record of a snapshot whose record write was lost,
    /// keeping one record per consecutive snapshot pair.
    async fn ensure_change_record(&self, snapshot: &Snapshot) -> Result<()> {
        let id = change_record_id(&snapshot.profile_id, snapshot.captured_at);
        if self.changes.get_change_record(&id)?.is_some() {
            return Ok(());
        }
        warn!("Snapshot {} has no change record, rebuilding it", snapshot.id());
        let predecessor = self
            .snapshots
            .get_latest_snapshot_before(&snapshot.profile_id, snapshot.captured_at)?;
        let record = self.diff_against(predecessor.as_ref(), snapshot)?;
        self.changes.put_change_record(&record).await
    }
}
