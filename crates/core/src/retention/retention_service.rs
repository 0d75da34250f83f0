use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use log::info;
use serde::Serialize;
use std::sync::Arc;

use crate::changelog::ChangeRecordRepositoryTrait;
use crate::constants::DEFAULT_RETENTION_DAYS;
use crate::errors::{Error, Result};
use crate::positions::SnapshotRepositoryTrait;
use crate::utils::time_utils::{day_window, DEFAULT_DISPLAY_TZ};

/// Rows removed by a cleanup or a day deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub snapshots_deleted: usize,
    /// Change records plus capture failures.
    pub records_deleted: usize,
}

pub struct RetentionService {
    snapshots: Arc<dyn SnapshotRepositoryTrait>,
    changes: Arc<dyn ChangeRecordRepositoryTrait>,
    retention_days: i64,
    tz: Tz,
}

impl RetentionService {
    pub fn new(
        snapshots: Arc<dyn SnapshotRepositoryTrait>,
        changes: Arc<dyn ChangeRecordRepositoryTrait>,
    ) -> Self {
        Self {
            snapshots,
            changes,
            retention_days: DEFAULT_RETENTION_DAYS,
            tz: DEFAULT_DISPLAY_TZ,
        }
    }

    pub fn with_retention_days(mut self, days: i64) -> Result<Self> {
        if days <= 0 {
            return Err(Error::InvalidConfigValue(format!(
                "retention days must be positive, got {}",
                days
            )));
        }
        self.retention_days = days;
        Ok(self)
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn retention_days(&self) -> i64 {
        self.retention_days
    }

    /// Deletes everything captured more than the retention window before `now`.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> Result<DeletionReport> {
        let cutoff = now - Duration::days(self.retention_days);
        // Records first so a crash never leaves a record without its snapshot.
        let records_deleted = self.changes.delete_change_records_before(cutoff).await?;
        let snapshots_deleted = self.snapshots.delete_snapshots_before(cutoff).await?;

        let report = DeletionReport {
            snapshots_deleted,
            records_deleted,
        };
        if report != DeletionReport::default() {
            info!(
                "Retention cleanup removed {} snapshots and {} records older than {}",
                snapshots_deleted, records_deleted, cutoff
            );
        }
        Ok(report)
    }

    /// Deletes all snapshots, records and failures of every profile on `day`.
    pub async fn delete_day(&self, day: NaiveDate) -> Result<DeletionReport> {
        let range = day_window(day, self.tz);
        let records_deleted = self.changes.delete_change_records_in_range(range).await?;
        let snapshots_deleted = self.snapshots.delete_snapshots_in_range(range).await?;
        info!(
            "Deleted data for {}: {} records, {} snapshots",
            day, records_deleted, snapshots_deleted
        );
        Ok(DeletionReport {
            snapshots_deleted,
            records_deleted,
        })
    }
}
