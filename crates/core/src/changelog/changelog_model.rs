//! Daily log view models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::TIMESTAMP_FORMAT;
use crate::diff::ChangeRecord;
use crate::positions::{InstrumentId, Position};

/// Marks an interval whose capture or diff failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureFailure {
    pub id: String,
    pub profile_id: String,
    pub attempted_at: DateTime<Utc>,
    pub reason: String,
}

impl CaptureFailure {
    pub fn new(
        profile_id: impl Into<String>,
        attempted_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        let profile_id = profile_id.into();
        CaptureFailure {
            id: format!(
                "{}_{}_failed",
                profile_id,
                attempted_at.format(TIMESTAMP_FORMAT)
            ),
            profile_id,
            attempted_at,
            reason: reason.into(),
        }
    }
}

/// One row of the full timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimelineEntry {
    Change { record: ChangeRecord },
    Failed { failure: CaptureFailure },
}

impl TimelineEntry {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            TimelineEntry::Change { record } => record.current_at,
            TimelineEntry::Failed { failure } => failure.attempted_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeDirection {
    Increase,
    Decrease,
    /// Quantity unchanged; only the average price moved.
    Repriced,
}

/// Human-facing description of one instrument's change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionChangeLine {
    pub instrument_id: InstrumentId,
    pub symbol: String,
    pub kind: ChangeKind,
    pub previous_quantity: i64,
    pub current_quantity: i64,
    pub quantity_change: i128,
    pub direction: ChangeDirection,
    pub previous_average_price: Option<Decimal>,
    pub current_average_price: Option<Decimal>,
}

impl PositionChangeLine {
    fn added(position: &Position) -> Self {
        Self::build(
            position,
            ChangeKind::Added,
            0,
            position.quantity,
            None,
            Some(position.average_price),
        )
    }

    fn removed(position: &Position) -> Self {
        Self::build(
            position,
            ChangeKind::Removed,
            position.quantity,
            0,
            Some(position.average_price),
            None,
        )
    }

    fn build(
        position: &Position,
        kind: ChangeKind,
        previous_quantity: i64,
        current_quantity: i64,
        previous_average_price: Option<Decimal>,
        current_average_price: Option<Decimal>,
    ) -> Self {
        let quantity_change = i128::from(current_quantity) - i128::from(previous_quantity);
        PositionChangeLine {
            instrument_id: position.instrument_id.clone(),
            symbol: position.symbol.clone(),
            kind,
            previous_quantity,
            current_quantity,
            quantity_change,
            direction: direction_of(quantity_change),
            previous_average_price,
            current_average_price,
        }
    }

    /// e.g. "Qty: 10 → 15 (+5)"
    pub fn text(&self) -> String {
        let sign = if self.quantity_change > 0 { "+" } else { "" };
        format!(
            "Qty: {} → {} ({}{})",
            self.previous_quantity, self.current_quantity, sign, self.quantity_change
        )
    }
}

fn direction_of(quantity_change: i128) -> ChangeDirection {
    match quantity_change {
        q if q > 0 => ChangeDirection::Increase,
        q if q < 0 => ChangeDirection::Decrease,
        _ => ChangeDirection::Repriced,
    }
}

/// One row of the action log: a non-empty change record rendered per
/// instrument. Added lines come first, then removed, then modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
    pub record_id: String,
    pub profile_id: String,
    pub at: DateTime<Utc>,
    pub previous_at: Option<DateTime<Utc>>,
    pub summary: String,
    pub changes: Vec<PositionChangeLine>,
}

impl From<&ChangeRecord> for ActionLogEntry {
    fn from(record: &ChangeRecord) -> Self {
        let diff = &record.diff;
        let mut changes = Vec::with_capacity(diff.change_count());
        changes.extend(diff.added.iter().map(PositionChangeLine::added));
        changes.extend(diff.removed.iter().map(PositionChangeLine::removed));
        changes.extend(diff.modified.iter().map(|m| {
            PositionChangeLine::build(
                &m.current,
                ChangeKind::Modified,
                m.previous.quantity,
                m.current.quantity,
                Some(m.previous.average_price),
                Some(m.current.average_price),
            )
        }));

        ActionLogEntry {
            record_id: record.id.clone(),
            profile_id: record.profile_id.clone(),
            at: record.current_at,
            previous_at: record.previous_at,
            summary: record.summary(),
            changes,
        }
    }
}
