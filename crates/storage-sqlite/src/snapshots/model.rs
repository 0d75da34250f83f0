//! Database model for position snapshots.

use diesel::prelude::*;
use diesel::sql_types::{Integer, Nullable, Text};
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use tradewatch_core::constants::DECIMAL_PRECISION;
use tradewatch_core::positions::{Position, Snapshot};
use tradewatch_core::utils::time_utils::{format_timestamp, parse_timestamp};
use tradewatch_core::Error;

/// Database model for snapshots. Positions are stored as a JSON array in
/// instrument id order; P&L totals are denormalized for cheap listing.
#[derive(Debug, Clone, Queryable, QueryableByName, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDB {
    #[diesel(sql_type = Text)]
    pub id: String,
    #[diesel(sql_type = Text)]
    pub profile_id: String,
    #[diesel(sql_type = Text)]
    pub captured_at: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub source_created_at: Option<String>,
    #[diesel(sql_type = Text)]
    pub positions: String,
    #[diesel(sql_type = Integer)]
    pub position_count: i32,
    #[diesel(sql_type = Text)]
    pub total_pnl: String,
    #[diesel(sql_type = Text)]
    pub booked_pnl: String,
}

impl TryFrom<&Snapshot> for SnapshotDB {
    type Error = StorageError;

    fn try_from(snapshot: &Snapshot) -> Result<Self, Self::Error> {
        let positions: Vec<&Position> = snapshot.positions().values().collect();
        Ok(Self {
            id: snapshot.id(),
            profile_id: snapshot.profile_id.clone(),
            captured_at: format_timestamp(snapshot.captured_at),
            source_created_at: snapshot.source_created_at.clone(),
            positions: serde_json::to_string(&positions)?,
            position_count: i32::try_from(positions.len()).unwrap_or(i32::MAX),
            total_pnl: snapshot.total_pnl().round_dp(DECIMAL_PRECISION).to_string(),
            booked_pnl: snapshot.booked_pnl().round_dp(DECIMAL_PRECISION).to_string(),
        })
    }
}

impl TryFrom<SnapshotDB> for Snapshot {
    type Error = Error;

    fn try_from(db: SnapshotDB) -> Result<Self, Self::Error> {
        let captured_at = parse_timestamp(&db.captured_at)?;
        let positions: Vec<Position> =
            serde_json::from_str(&db.positions).map_err(StorageError::from)?;
        Ok(Snapshot::new(db.profile_id, captured_at, positions)?
            .with_source_created_at(db.source_created_at))
    }
}
