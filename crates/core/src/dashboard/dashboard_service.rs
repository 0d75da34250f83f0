use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::{ActivityCell, ActivityMatrix, ActivityRow, DailyLogEvent, DailyLogView};
use crate::changelog::{ChangeLogBuilder, ChangeRecordRepositoryTrait};
use crate::constants::DEFAULT_RETENTION_DAYS;
use crate::errors::Result;
use crate::pnl::PnlService;
use crate::positions::SnapshotRepositoryTrait;
use crate::profiles::ProfileRepositoryTrait;
use crate::utils::time_utils::{local_date, start_of_day, DEFAULT_DISPLAY_TZ};

pub struct DashboardService {
    profiles: Arc<dyn ProfileRepositoryTrait>,
    changes: Arc<dyn ChangeRecordRepositoryTrait>,
    changelog: ChangeLogBuilder,
    pnl: PnlService,
    tz: Tz,
    lookback_days: i64,
}

impl DashboardService {
    pub fn new(
        profiles: Arc<dyn ProfileRepositoryTrait>,
        snapshots: Arc<dyn SnapshotRepositoryTrait>,
        changes: Arc<dyn ChangeRecordRepositoryTrait>,
    ) -> Self {
        Self {
            profiles,
            changelog: ChangeLogBuilder::new(changes.clone()),
            changes,
            pnl: PnlService::new(snapshots),
            tz: DEFAULT_DISPLAY_TZ,
            lookback_days: DEFAULT_RETENTION_DAYS,
        }
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.changelog = self.changelog.with_timezone(tz);
        self.pnl = self.pnl.with_timezone(tz);
        self.tz = tz;
        self
    }

    /// How far back active dates are searched for.
    pub fn with_lookback_days(mut self, days: i64) -> Self {
        self.lookback_days = days.max(1);
        self
    }

    pub fn changelog(&self) -> &ChangeLogBuilder {
        &self.changelog
    }

    pub fn pnl(&self) -> &PnlService {
        &self.pnl
    }

    /// Builds the matrix of profiles (display order) by the most recent
    /// `days` dates on which any profile had a non-empty change.
    pub fn activity_matrix(&self, days: usize, now: DateTime<Utc>) -> Result<ActivityMatrix> {
        let today = local_date(now, self.tz);
        let since = start_of_day(today - Duration::days(self.lookback_days), self.tz);
        let records = self.changes.list_change_records_since(since)?;

        let last_updated = records.iter().map(|r| r.current_at).max();

        let mut counts: HashMap<(String, NaiveDate), usize> = HashMap::new();
        let mut active_dates: BTreeSet<NaiveDate> = BTreeSet::new();
        for record in records.iter().filter(|r| !r.is_no_op()) {
            let date = local_date(record.current_at, self.tz);
            active_dates.insert(date);
            *counts.entry((record.profile_id.clone(), date)).or_insert(0) += 1;
        }
        let dates: Vec<NaiveDate> = active_dates.into_iter().rev().take(days).collect();

        let mut rows = Vec::new();
        for profile in self.profiles.list_profiles()? {
            let mut cells = Vec::with_capacity(dates.len());
            for date in &dates {
                let count = counts
                    .get(&(profile.id.clone(), *date))
                    .copied()
                    .unwrap_or(0);
                let pnl = if count > 0 {
                    self.pnl.daily_metrics(&profile.id, *date)?.todays_pnl
                } else {
                    Decimal::ZERO
                };
                cells.push(ActivityCell { count, pnl });
            }
            rows.push(ActivityRow { profile, cells });
        }

        Ok(ActivityMatrix {
            dates,
            rows,
            last_updated,
        })
    }

    /// The action log of a day, each entry annotated with the P&L of the
    /// snapshot it produced.
    pub fn daily_log(&self, profile_id: &str, day: NaiveDate) -> Result<DailyLogView> {
        let metrics = self.pnl.daily_metrics(profile_id, day)?;
        let mut events = Vec::new();
        for entry in self.changelog.action_log(profile_id, day)? {
            let (total, booked) = self
                .pnl
                .snapshot_pnl(profile_id, entry.at)?
                .unwrap_or((metrics.start_pnl, Decimal::ZERO));
            events.push(DailyLogEvent {
                entry,
                todays_pnl: total - metrics.start_pnl,
                booked_pnl: booked,
            });
        }
        Ok(DailyLogView {
            profile_id: profile_id.to_string(),
            day,
            metrics,
            events,
        })
    }
}
