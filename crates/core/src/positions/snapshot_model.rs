//! Snapshot domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{InstrumentId, Position};
use crate::constants::TIMESTAMP_FORMAT;
use crate::errors::{Result, ValidationError};

/// Point-in-time record of all positions held by one profile.
///
/// Positions are keyed by instrument id and kept in key order, so iteration
/// and serialization never depend on insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub profile_id: String,
    pub captured_at: DateTime<Utc>,
    /// Creation time reported by the position source, verbatim.
    #[serde(default)]
    pub source_created_at: Option<String>,
    #[serde(default)]
    positions: BTreeMap<InstrumentId, Position>,
}

impl Snapshot {
    /// Builds a snapshot, rejecting duplicate instrument ids.
    pub fn new(
        profile_id: impl Into<String>,
        captured_at: DateTime<Utc>,
        positions: Vec<Position>,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        for position in positions {
            if position.instrument_id.as_str().is_empty() {
                return Err(ValidationError::MissingField("instrumentId".to_string()).into());
            }
            let key = position.instrument_id.clone();
            if map.insert(key.clone(), position).is_some() {
                return Err(ValidationError::InvalidInput(format!(
                    "duplicate instrument '{}' in snapshot",
                    key
                ))
                .into());
            }
        }
        Ok(Self::from_map(profile_id.into(), captured_at, map))
    }

    pub fn empty(profile_id: impl Into<String>, captured_at: DateTime<Utc>) -> Self {
        Self::from_map(profile_id.into(), captured_at, BTreeMap::new())
    }

    pub(crate) fn from_map(
        profile_id: String,
        captured_at: DateTime<Utc>,
        positions: BTreeMap<InstrumentId, Position>,
    ) -> Self {
        Snapshot {
            profile_id,
            captured_at,
            source_created_at: None,
            positions,
        }
    }

    pub fn with_source_created_at(mut self, created_at: Option<String>) -> Self {
        self.source_created_at = created_at;
        self
    }

    /// Storage id, e.g. "trader-one_2024-03-04T04:30:00.000000Z".
    pub fn id(&self) -> String {
        snapshot_id(&self.profile_id, self.captured_at)
    }

    pub fn positions(&self) -> &BTreeMap<InstrumentId, Position> {
        &self.positions
    }

    pub(crate) fn into_positions(self) -> BTreeMap<InstrumentId, Position> {
        self.positions
    }

    pub fn get(&self, instrument_id: &InstrumentId) -> Option<&Position> {
        self.positions.get(instrument_id)
    }

    pub fn contains(&self, instrument_id: &InstrumentId) -> bool {
        self.positions.contains_key(instrument_id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Compares the holdings of two snapshots, ignoring profile, timestamps
    /// and informational P&L fields.
    pub fn is_content_equal(&self, other: &Self) -> bool {
        self.mismatched_instruments(other).is_empty()
    }

    /// Instrument ids whose holding differs between the two snapshots,
    /// in key order.
    pub fn mismatched_instruments(&self, other: &Self) -> Vec<InstrumentId> {
        let mut mismatched: Vec<InstrumentId> = Vec::new();
        for (id, position) in &self.positions {
            match other.positions.get(id) {
                Some(other_position) if position.is_same_holding(other_position) => {}
                _ => mismatched.push(id.clone()),
            }
        }
        for id in other.positions.keys() {
            if !self.positions.contains_key(id) {
                mismatched.push(id.clone());
            }
        }
        mismatched.sort();
        mismatched
    }

    /// Unrealized plus booked P&L across all positions.
    pub fn total_pnl(&self) -> Decimal {
        self.positions.values().map(Position::total_pnl).sum()
    }

    pub fn booked_pnl(&self) -> Decimal {
        self.positions.values().map(|p| p.booked_pnl).sum()
    }
}

pub fn snapshot_id(profile_id: &str, captured_at: DateTime<Utc>) -> String {
    format!("{}_{}", profile_id, captured_at.format(TIMESTAMP_FORMAT))
}
