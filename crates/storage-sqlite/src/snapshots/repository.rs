use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::SnapshotDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::snapshots;
use crate::schema::snapshots::dsl::*;
use tradewatch_core::errors::Result;
use tradewatch_core::positions::{Snapshot, SnapshotRepositoryTrait};
use tradewatch_core::utils::time_utils::{format_timestamp, TimeRange};

pub struct SnapshotRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn to_domain(rows: Vec<SnapshotDB>) -> Result<Vec<Snapshot>> {
        rows.into_iter().map(Snapshot::try_from).collect()
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    fn get_snapshot(
        &self,
        input_profile_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let row = snapshots
            .filter(profile_id.eq(input_profile_id))
            .filter(captured_at.eq(format_timestamp(at)))
            .first::<SnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(Snapshot::try_from).transpose()
    }

    fn get_latest_snapshot_before(
        &self,
        input_profile_id: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let row = snapshots
            .filter(profile_id.eq(input_profile_id))
            .filter(captured_at.lt(format_timestamp(before)))
            .order(captured_at.desc())
            .first::<SnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(Snapshot::try_from).transpose()
    }

    fn get_latest_snapshot(&self, input_profile_id: &str) -> Result<Option<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let row = snapshots
            .filter(profile_id.eq(input_profile_id))
            .order(captured_at.desc())
            .first::<SnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(Snapshot::try_from).transpose()
    }

    fn list_snapshots(&self, input_profile_id: &str, range: TimeRange) -> Result<Vec<Snapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = snapshots
            .filter(profile_id.eq(input_profile_id))
            .filter(captured_at.ge(format_timestamp(range.start)))
            .filter(captured_at.lt(format_timestamp(range.end)))
            .order(captured_at.asc())
            .load::<SnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;
        if !rows.is_empty() {
            debug!(
                "Loaded {} snapshots for {} between {} and {}",
                rows.len(),
                input_profile_id,
                range.start,
                range.end
            );
        }
        Self::to_domain(rows)
    }

    fn has_snapshots(&self, input_profile_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        let count: i64 = snapshots
            .filter(profile_id.eq(input_profile_id))
            .count()
            .get_result(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    async fn put_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let row = SnapshotDB::try_from(snapshot)?;
        self.writer
            .exec(move |conn| {
                diesel::replace_into(snapshots::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn delete_snapshots_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let cutoff_str = format_timestamp(cutoff);
        self.writer
            .exec(move |conn| {
                Ok(diesel::delete(snapshots.filter(captured_at.lt(cutoff_str)))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    async fn delete_snapshots_in_range(&self, range: TimeRange) -> Result<usize> {
        let start_str = format_timestamp(range.start);
        let end_str = format_timestamp(range.end);
        self.writer
            .exec(move |conn| {
                Ok(diesel::delete(
                    snapshots
                        .filter(captured_at.ge(start_str))
                        .filter(captured_at.lt(end_str)),
                )
                .execute(conn)
                .map_err(StorageError::from)?)
            })
            .await
    }
}
