use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::CaptureFailure;
use crate::diff::ChangeRecord;
use crate::errors::Result;
use crate::utils::time_utils::TimeRange;

/// Audit-log storage for change records and capture failures.
#[async_trait]
pub trait ChangeRecordRepositoryTrait: Send + Sync {
    /// Persist a change record. Records are keyed by id, so a retried write
    /// replaces the earlier one.
    async fn put_change_record(&self, record: &ChangeRecord) -> Result<()>;

    fn get_change_record(&self, id: &str) -> Result<Option<ChangeRecord>>;

    /// Records of a profile whose current timestamp falls within `range`,
    /// ordered by current timestamp ascending.
    fn list_change_records(&self, profile_id: &str, range: TimeRange)
        -> Result<Vec<ChangeRecord>>;

    /// Records of all profiles with current timestamp at or after `since`,
    /// ordered by current timestamp ascending.
    fn list_change_records_since(&self, since: DateTime<Utc>) -> Result<Vec<ChangeRecord>>;

    async fn put_capture_failure(&self, failure: &CaptureFailure) -> Result<()>;

    /// Failures of a profile within `range`, ordered by attempt time ascending.
    fn list_capture_failures(&self, profile_id: &str, range: TimeRange)
        -> Result<Vec<CaptureFailure>>;

    /// Delete records and failures of all profiles before `cutoff`.
    async fn delete_change_records_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Delete records and failures of all profiles within `range`.
    async fn delete_change_records_in_range(&self, range: TimeRange) -> Result<usize>;
}
