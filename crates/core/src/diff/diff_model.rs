//! Diff and change record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::TIMESTAMP_FORMAT;
use crate::positions::{InstrumentId, Position};

/// A position present in both snapshots whose holding changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedPosition {
    pub instrument_id: InstrumentId,
    pub previous: Position,
    pub current: Position,
    /// `current.quantity - previous.quantity`, widened so extreme quantities
    /// cannot overflow.
    pub quantity_change: i128,
}

impl ModifiedPosition {
    pub fn new(previous: Position, current: Position) -> Self {
        ModifiedPosition {
            instrument_id: current.instrument_id.clone(),
            quantity_change: i128::from(current.quantity) - i128::from(previous.quantity),
            previous,
            current,
        }
    }
}

/// Classification of position changes between two snapshots.
///
/// The three lists are pairwise disjoint by instrument id and each is sorted
/// by instrument id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diff {
    pub added: Vec<Position>,
    pub removed: Vec<Position>,
    pub modified: Vec<ModifiedPosition>,
}

impl Diff {
    /// A no-op diff: nothing was added, removed or modified.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    pub fn added_ids(&self) -> Vec<&InstrumentId> {
        self.added.iter().map(|p| &p.instrument_id).collect()
    }

    pub fn removed_ids(&self) -> Vec<&InstrumentId> {
        self.removed.iter().map(|p| &p.instrument_id).collect()
    }

    pub fn modified_ids(&self) -> Vec<&InstrumentId> {
        self.modified.iter().map(|m| &m.instrument_id).collect()
    }
}

/// A persisted diff with the profile and timestamp pair it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub id: String,
    pub profile_id: String,
    /// Absent for the first snapshot of a profile.
    pub previous_at: Option<DateTime<Utc>>,
    pub current_at: DateTime<Utc>,
    pub diff: Diff,
}

impl ChangeRecord {
    pub fn new(
        profile_id: impl Into<String>,
        previous_at: Option<DateTime<Utc>>,
        current_at: DateTime<Utc>,
        diff: Diff,
    ) -> Self {
        let profile_id = profile_id.into();
        ChangeRecord {
            id: change_record_id(&profile_id, current_at),
            profile_id,
            previous_at,
            current_at,
            diff,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.previous_at.is_none()
    }

    pub fn is_no_op(&self) -> bool {
        self.diff.is_empty()
    }

    /// One-line description for list views.
    pub fn summary(&self) -> String {
        if self.is_initial() {
            return format!("Initial Snapshot ({} positions)", self.diff.added.len());
        }
        if self.is_no_op() {
            return "No Change".to_string();
        }
        let mut parts = Vec::new();
        if !self.diff.added.is_empty() {
            parts.push(format!("Positions Added ({})", self.diff.added.len()));
        }
        if !self.diff.removed.is_empty() {
            parts.push(format!("Positions Removed ({})", self.diff.removed.len()));
        }
        if !self.diff.modified.is_empty() {
            parts.push(format!("Positions Modified ({})", self.diff.modified.len()));
        }
        parts.join(", ")
    }
}

/// Change records are keyed by profile and current timestamp, so a retried
/// persist of the same snapshot pair overwrites rather than duplicates.
pub fn change_record_id(profile_id: &str, current_at: DateTime<Utc>) -> String {
    format!("{}_{}", profile_id, current_at.format(TIMESTAMP_FORMAT))
}
