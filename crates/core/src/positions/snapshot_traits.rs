//! Repository trait for position snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Snapshot;
use crate::errors::Result;
use crate::utils::time_utils::TimeRange;

/// Keyed storage of snapshots by (profile, capture timestamp).
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Get the snapshot captured for a profile at exactly `captured_at`.
    fn get_snapshot(&self, profile_id: &str, captured_at: DateTime<Utc>)
        -> Result<Option<Snapshot>>;

    /// Get the latest snapshot captured strictly before `before`.
    fn get_latest_snapshot_before(
        &self,
        profile_id: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<Snapshot>>;

    /// Get the most recent snapshot of a profile.
    fn get_latest_snapshot(&self, profile_id: &str) -> Result<Option<Snapshot>>;

    /// Get all snapshots of a profile within `range`, oldest first.
    fn list_snapshots(&self, profile_id: &str, range: TimeRange) -> Result<Vec<Snapshot>>;

    /// Whether any snapshot exists for the profile.
    fn has_snapshots(&self, profile_id: &str) -> Result<bool>;

    /// Persist a snapshot. Writing the same (profile, timestamp) twice replaces it.
    async fn put_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    /// Delete snapshots of all profiles captured before `cutoff`.
    async fn delete_snapshots_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;

    /// Delete snapshots of all profiles captured within `range`.
    async fn delete_snapshots_in_range(&self, range: TimeRange) -> Result<usize>;
}
