use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use super::model::{CaptureFailureDB, ChangeRecordDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{capture_failures, change_records};
use tradewatch_core::changelog::{CaptureFailure, ChangeRecordRepositoryTrait};
use tradewatch_core::diff::ChangeRecord;
use tradewatch_core::errors::Result;
use tradewatch_core::utils::time_utils::{format_timestamp, TimeRange};

pub struct ChangeRecordRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ChangeRecordRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ChangeRecordRepositoryTrait for ChangeRecordRepository {
    async fn put_change_record(&self, record: &ChangeRecord) -> Result<()> {
        let row = ChangeRecordDB::try_from(record)?;
        self.writer
            .exec(move |conn| {
                diesel::replace_into(change_records::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn get_change_record(&self, record_id: &str) -> Result<Option<ChangeRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let row = change_records::table
            .find(record_id)
            .select(ChangeRecordDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(ChangeRecord::try_from).transpose()
    }

    fn list_change_records(
        &self,
        input_profile_id: &str,
        range: TimeRange,
    ) -> Result<Vec<ChangeRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = change_records::table
            .filter(change_records::profile_id.eq(input_profile_id))
            .filter(change_records::current_at.ge(format_timestamp(range.start)))
            .filter(change_records::current_at.lt(format_timestamp(range.end)))
            .order((change_records::current_at.asc(), change_records::id.asc()))
            .select(ChangeRecordDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(ChangeRecord::try_from).collect()
    }

    fn list_change_records_since(&self, since: DateTime<Utc>) -> Result<Vec<ChangeRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = change_records::table
            .filter(change_records::current_at.ge(format_timestamp(since)))
            .order((change_records::current_at.asc(), change_records::id.asc()))
            .select(ChangeRecordDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(ChangeRecord::try_from).collect()
    }

    async fn put_capture_failure(&self, failure: &CaptureFailure) -> Result<()> {
        let row = CaptureFailureDB::from(failure);
        self.writer
            .exec(move |conn| {
                diesel::replace_into(capture_failures::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn list_capture_failures(
        &self,
        input_profile_id: &str,
        range: TimeRange,
    ) -> Result<Vec<CaptureFailure>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = capture_failures::table
            .filter(capture_failures::profile_id.eq(input_profile_id))
            .filter(capture_failures::attempted_at.ge(format_timestamp(range.start)))
            .filter(capture_failures::attempted_at.lt(format_timestamp(range.end)))
            .order(capture_failures::attempted_at.asc())
            .select(CaptureFailureDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(CaptureFailure::try_from).collect()
    }

    async fn delete_change_records_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let cutoff_str = format_timestamp(cutoff);
        self.writer
            .exec(move |conn| {
                let records = diesel::delete(
                    change_records::table.filter(change_records::current_at.lt(&cutoff_str)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let failures = diesel::delete(
                    capture_failures::table.filter(capture_failures::attempted_at.lt(&cutoff_str)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(records + failures)
            })
            .await
    }

    async fn delete_change_records_in_range(&self, range: TimeRange) -> Result<usize> {
        let start_str = format_timestamp(range.start);
        let end_str = format_timestamp(range.end);
        self.writer
            .exec(move |conn| {
                let records = diesel::delete(
                    change_records::table
                        .filter(change_records::current_at.ge(&start_str))
                        .filter(change_records::current_at.lt(&end_str)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                let failures = diesel::delete(
                    capture_failures::table
                        .filter(capture_failures::attempted_at.ge(&start_str))
                        .filter(capture_failures::attempted_at.lt(&end_str)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(records + failures)
            })
            .await
    }
}
