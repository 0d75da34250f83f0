use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::changelog::ActionLogEntry;
use crate::pnl::DailyPnlMetrics;
use crate::profiles::Profile;

/// Activity of one profile on one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCell {
    /// Number of change records that changed something.
    pub count: usize,
    /// Today's P&L for the date; zero when there was no activity.
    pub pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    pub profile: Profile,
    /// One cell per entry of `ActivityMatrix::dates`.
    pub cells: Vec<ActivityCell>,
}

/// Profiles by recent active dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMatrix {
    /// Dates with activity, newest first.
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<ActivityRow>,
    /// Latest capture time across all profiles.
    pub last_updated: Option<DateTime<Utc>>,
}

/// An action log entry with the P&L of the snapshot it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogEvent {
    #[serde(flatten)]
    pub entry: ActionLogEntry,
    pub todays_pnl: Decimal,
    pub booked_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogView {
    pub profile_id: String,
    pub day: NaiveDate,
    pub metrics: DailyPnlMetrics,
    /// Latest first.
    pub events: Vec<DailyLogEvent>,
}
