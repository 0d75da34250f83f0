use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// P&L figures of one profile for one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPnlMetrics {
    /// Unbooked P&L carried into the day.
    pub start_pnl: Decimal,
    /// Total P&L of the latest snapshot of the day.
    pub current_pnl: Decimal,
    /// `current_pnl - start_pnl`
    pub todays_pnl: Decimal,
    pub booked_pnl: Decimal,
    /// Capture time of the snapshot the current figures come from.
    pub last_updated: Option<DateTime<Utc>>,
}
