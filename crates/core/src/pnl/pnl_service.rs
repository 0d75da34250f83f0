use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::DailyPnlMetrics;
use crate::errors::Result;
use crate::positions::{Snapshot, SnapshotRepositoryTrait};
use crate::utils::time_utils::{day_window, DEFAULT_DISPLAY_TZ};

pub struct PnlService {
    snapshots: Arc<dyn SnapshotRepositoryTrait>,
    tz: Tz,
}

impl PnlService {
    pub fn new(snapshots: Arc<dyn SnapshotRepositoryTrait>) -> Self {
        Self {
            snapshots,
            tz: DEFAULT_DISPLAY_TZ,
        }
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    /// Computes start, current, today's and booked P&L for a day.
    ///
    /// The start value is the unbooked P&L of the last snapshot before the
    /// day; a profile without earlier history starts from the total of its
    /// first snapshot of the day. A day without snapshots reports zero
    /// movement.
    pub fn daily_metrics(&self, profile_id: &str, day: NaiveDate) -> Result<DailyPnlMetrics> {
        let range = day_window(day, self.tz);
        let day_snapshots = self.snapshots.list_snapshots(profile_id, range)?;

        let start_pnl = match self
            .snapshots
            .get_latest_snapshot_before(profile_id, range.start)?
        {
            Some(previous) => previous.total_pnl() - previous.booked_pnl(),
            None => day_snapshots
                .first()
                .map(Snapshot::total_pnl)
                .unwrap_or(Decimal::ZERO),
        };

        let metrics = match day_snapshots.last() {
            Some(latest) => {
                let current_pnl = latest.total_pnl();
                DailyPnlMetrics {
                    start_pnl,
                    current_pnl,
                    todays_pnl: current_pnl - start_pnl,
                    booked_pnl: latest.booked_pnl(),
                    last_updated: Some(latest.captured_at),
                }
            }
            None => DailyPnlMetrics {
                start_pnl,
                current_pnl: start_pnl,
                ..Default::default()
            },
        };
        Ok(metrics)
    }

    /// Total and booked P&L of the snapshot captured at `captured_at`.
    pub fn snapshot_pnl(
        &self,
        profile_id: &str,
        captured_at: DateTime<Utc>,
    ) -> Result<Option<(Decimal, Decimal)>> {
        Ok(self
            .snapshots
            .get_snapshot(profile_id, captured_at)?
            .map(|snapshot| (snapshot.total_pnl(), snapshot.booked_pnl())))
    }
}
