//! Database models for change records and capture failures.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use tradewatch_core::changelog::CaptureFailure;
use tradewatch_core::diff::{ChangeRecord, Diff};
use tradewatch_core::utils::time_utils::{format_timestamp, parse_timestamp};
use tradewatch_core::Error;

/// Database model for change records. The diff is stored as JSON; the
/// per-kind counts allow filtering no-ops without decoding it.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::change_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecordDB {
    pub id: String,
    pub profile_id: String,
    pub previous_at: Option<String>,
    pub current_at: String,
    pub diff: String,
    pub added_count: i32,
    pub removed_count: i32,
    pub modified_count: i32,
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

impl TryFrom<&ChangeRecord> for ChangeRecordDB {
    type Error = StorageError;

    fn try_from(record: &ChangeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: record.id.clone(),
            profile_id: record.profile_id.clone(),
            previous_at: record.previous_at.map(format_timestamp),
            current_at: format_timestamp(record.current_at),
            diff: serde_json::to_string(&record.diff)?,
            added_count: count(record.diff.added.len()),
            removed_count: count(record.diff.removed.len()),
            modified_count: count(record.diff.modified.len()),
        })
    }
}

impl TryFrom<ChangeRecordDB> for ChangeRecord {
    type Error = Error;

    fn try_from(db: ChangeRecordDB) -> Result<Self, Self::Error> {
        let diff: Diff = serde_json::from_str(&db.diff).map_err(StorageError::from)?;
        Ok(ChangeRecord {
            id: db.id,
            profile_id: db.profile_id,
            previous_at: db.previous_at.as_deref().map(parse_timestamp).transpose()?,
            current_at: parse_timestamp(&db.current_at)?,
            diff,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::capture_failures)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct CaptureFailureDB {
    pub id: String,
    pub profile_id: String,
    pub attempted_at: String,
    pub reason: String,
}

impl From<&CaptureFailure> for CaptureFailureDB {
    fn from(failure: &CaptureFailure) -> Self {
        Self {
            id: failure.id.clone(),
            profile_id: failure.profile_id.clone(),
            attempted_at: format_timestamp(failure.attempted_at),
            reason: failure.reason.clone(),
        }
    }
}

impl TryFrom<CaptureFailureDB> for CaptureFailure {
    type Error = Error;

    fn try_from(db: CaptureFailureDB) -> Result<Self, Self::Error> {
        Ok(CaptureFailure {
            id: db.id,
            profile_id: db.profile_id,
            attempted_at: parse_timestamp(&db.attempted_at)?,
            reason: db.reason,
        })
    }
}
