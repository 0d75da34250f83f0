use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::TIMESTAMP_FORMAT;

/// Default timezone for display days and market hours.
/// The tracked profiles trade on Indian exchanges.
pub const DEFAULT_DISPLAY_TZ: Tz = chrono_tz::Asia::Kolkata;

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Converts a UTC instant to the calendar date it falls on in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// UTC instant of local midnight starting `day` in `tz`.
pub fn start_of_day(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// The UTC range covered by calendar `day` in `tz`.
pub fn day_window(day: NaiveDate, tz: Tz) -> TimeRange {
    let next = day.succ_opt().unwrap_or(day);
    let start = start_of_day(day, tz);
    let mut end = start_of_day(next, tz);
    if end <= start {
        end = start + Duration::days(1);
    }
    TimeRange::new(start, end)
}

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> chrono::ParseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Trading session of the exchange the profiles trade on.
#[derive(Debug, Clone, Copy)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub tz: Tz,
}

impl Default for MarketHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
            tz: DEFAULT_DISPLAY_TZ,
        }
    }
}

impl MarketHours {
    pub fn with_tz(tz: Tz) -> Self {
        Self {
            tz,
            ..Self::default()
        }
    }

    /// Monday to Friday, open through close inclusive.
    pub fn is_open(&self, instant: DateTime<Utc>) -> bool {
        let local = instant.with_timezone(&self.tz);
        if local.weekday().number_from_monday() > 5 {
            return false;
        }
        let time = local.time();
        self.open <= time && time <= self.close
    }
}
