//! Builds the per-day views over stored change records.

use chrono::NaiveDate;
use chrono_tz::Tz;
use log::debug;
use std::sync::Arc;

use super::{ActionLogEntry, ChangeRecordRepositoryTrait, TimelineEntry};
use crate::diff::ChangeRecord;
use crate::errors::Result;
use crate::utils::time_utils::{day_window, TimeRange, DEFAULT_DISPLAY_TZ};

/// Change records of one profile and day, latest first.
///
/// The day's records are read from the store in one query when the log is
/// built; the iterator then hands them out latest first. Once consumed it
/// cannot be rewound, but calling `build_daily_log` again reads the store
/// afresh.
#[derive(Debug)]
pub struct DailyLog {
    records: std::iter::Rev<std::vec::IntoIter<ChangeRecord>>,
}

impl DailyLog {
    fn new(mut records: Vec<ChangeRecord>) -> Self {
        records.sort_by(|a, b| a.current_at.cmp(&b.current_at).then_with(|| a.id.cmp(&b.id)));
        DailyLog {
            records: records.into_iter().rev(),
        }
    }

    /// Only records that changed something.
    pub fn actions(self) -> impl Iterator<Item = ChangeRecord> {
        self.filter(|record| !record.is_no_op())
    }
}

impl Iterator for DailyLog {
    type Item = ChangeRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

pub struct ChangeLogBuilder {
    repository: Arc<dyn ChangeRecordRepositoryTrait>,
    tz: Tz,
}

impl ChangeLogBuilder {
    pub fn new(repository: Arc<dyn ChangeRecordRepositoryTrait>) -> Self {
        Self {
            repository,
            tz: DEFAULT_DISPLAY_TZ,
        }
    }

    /// Sets the timezone that defines calendar days.
    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn day_range(&self, day: NaiveDate) -> TimeRange {
        day_window(day, self.tz)
    }

    pub fn build_daily_log(&self, profile_id: &str, day: NaiveDate) -> Result<DailyLog> {
        let records = self
            .repository
            .list_change_records(profile_id, self.day_range(day))?;
        debug!(
            "Loaded {} change records for {} on {}",
            records.len(),
            profile_id,
            day
        );
        Ok(DailyLog::new(records))
    }

    /// Every record of the day including no-ops, plus failed capture
    /// markers, latest first.
    pub fn timeline(&self, profile_id: &str, day: NaiveDate) -> Result<Vec<TimelineEntry>> {
        let mut entries: Vec<TimelineEntry> = self
            .build_daily_log(profile_id, day)?
            .map(|record| TimelineEntry::Change { record })
            .collect();

        let failures = self
            .repository
            .list_capture_failures(profile_id, self.day_range(day))?;
        entries.extend(
            failures
                .into_iter()
                .map(|failure| TimelineEntry::Failed { failure }),
        );

        entries.sort_by(|a, b| b.at().cmp(&a.at()));
        Ok(entries)
    }

    /// Records that changed something, rendered per instrument, latest first.
    pub fn action_log(&self, profile_id: &str, day: NaiveDate) -> Result<Vec<ActionLogEntry>> {
        Ok(self
            .build_daily_log(profile_id, day)?
            .actions()
            .map(|record| ActionLogEntry::from(&record))
            .collect())
    }
}
