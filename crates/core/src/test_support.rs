//! In-memory repositories and sources shared by the service tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::capture::PositionSourceTrait;
use crate::changelog::{CaptureFailure, ChangeRecordRepositoryTrait};
use crate::diff::ChangeRecord;
use crate::errors::{DatabaseError, Error, Result};
use crate::positions::{
    Position, RawPositionGroup, RawPositionSnapshot, RawTrade, Snapshot, SnapshotRepositoryTrait,
};
use crate::profiles::{NewProfile, Profile, ProfileRepositoryTrait};
use crate::utils::time_utils::TimeRange;

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

pub fn position(symbol: &str, quantity: i64, average_price: &str) -> Position {
    Position::new(symbol, None, quantity, average_price.parse().unwrap())
}

pub fn position_with_pnl(
    symbol: &str,
    quantity: i64,
    average_price: &str,
    unrealized: &str,
    booked: &str,
) -> Position {
    let mut p = position(symbol, quantity, average_price);
    p.unrealized_pnl = unrealized.parse().unwrap();
    p.booked_pnl = booked.parse().unwrap();
    p
}

pub fn snapshot(profile_id: &str, at: DateTime<Utc>, positions: Vec<Position>) -> Snapshot {
    Snapshot::new(profile_id, at, positions).unwrap()
}

pub fn raw_trade(symbol: &str, quantity: i64, average_price: f64) -> RawTrade {
    RawTrade {
        trading_symbol: Some(symbol.to_string()),
        quantity: Some(serde_json::json!(quantity)),
        average_price: Some(serde_json::json!(average_price)),
        ..Default::default()
    }
}

pub fn raw_snapshot(trades: Vec<RawTrade>) -> RawPositionSnapshot {
    RawPositionSnapshot {
        created_at: None,
        data: vec![RawPositionGroup { trades }],
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemorySnapshotRepository {
    snapshots: Mutex<BTreeMap<(String, DateTime<Utc>), Snapshot>>,
}

impl InMemorySnapshotRepository {
    pub fn count(&self, profile_id: &str) -> usize {
        self.snapshots
            .lock()
            .unwrap()
            .keys()
            .filter(|(p, _)| p == profile_id)
            .count()
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for InMemorySnapshotRepository {
    fn get_snapshot(&self, profile_id: &str, captured_at: DateTime<Utc>) -> Result<Option<Snapshot>> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .get(&(profile_id.to_string(), captured_at))
            .cloned())
    }

    fn get_latest_snapshot_before(
        &self,
        profile_id: &str,
        before: DateTime<Utc>,
    ) -> Result<Option<Snapshot>> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.profile_id == profile_id && s.captured_at < before)
            .last()
            .cloned())
    }

    fn get_latest_snapshot(&self, profile_id: &str) -> Result<Option<Snapshot>> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.profile_id == profile_id)
            .last()
            .cloned())
    }

    fn list_snapshots(&self, profile_id: &str, range: TimeRange) -> Result<Vec<Snapshot>> {
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.profile_id == profile_id && range.contains(s.captured_at))
            .cloned()
            .collect())
    }

    fn has_snapshots(&self, profile_id: &str) -> Result<bool> {
        Ok(self.count(profile_id) > 0)
    }

    async fn put_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.snapshots.lock().unwrap().insert(
            (snapshot.profile_id.clone(), snapshot.captured_at),
            snapshot.clone(),
        );
        Ok(())
    }

    async fn delete_snapshots_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut snapshots = self.snapshots.lock().unwrap();
        let before = snapshots.len();
        snapshots.retain(|(_, at), _| *at >= cutoff);
        Ok(before - snapshots.len())
    }

    async fn delete_snapshots_in_range(&self, range: TimeRange) -> Result<usize> {
        let mut snapshots = self.snapshots.lock().unwrap();
        let before = snapshots.len();
        snapshots.retain(|(_, at), _| !range.contains(*at));
        Ok(before - snapshots.len())
    }
}

// ---------------------------------------------------------------------------
// Change records
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryChangeRecordRepository {
    records: Mutex<BTreeMap<String, ChangeRecord>>,
    failures: Mutex<BTreeMap<String, CaptureFailure>>,
    /// When set, record writes fail with this message.
    fail_writes: Mutex<Option<String>>,
}

impl InMemoryChangeRecordRepository {
    pub fn all_records(&self) -> Vec<ChangeRecord> {
        let mut records: Vec<ChangeRecord> =
            self.records.lock().unwrap().values().cloned().collect();
        records.sort_by_key(|r| r.current_at);
        records
    }

    pub fn all_failures(&self) -> Vec<CaptureFailure> {
        self.failures.lock().unwrap().values().cloned().collect()
    }

    pub fn fail_record_writes(&self, message: Option<&str>) {
        *self.fail_writes.lock().unwrap() = message.map(str::to_string);
    }

    pub fn remove_record(&self, id: &str) {
        self.records.lock().unwrap().remove(id);
    }
}

#[async_trait]
impl ChangeRecordRepositoryTrait for InMemoryChangeRecordRepository {
    async fn put_change_record(&self, record: &ChangeRecord) -> Result<()> {
        if let Some(message) = self.fail_writes.lock().unwrap().clone() {
            return Err(Error::Database(DatabaseError::QueryFailed(message)));
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn get_change_record(&self, id: &str) -> Result<Option<ChangeRecord>> {
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    fn list_change_records(&self, profile_id: &str, range: TimeRange) -> Result<Vec<ChangeRecord>> {
        Ok(self
            .all_records()
            .into_iter()
            .filter(|r| r.profile_id == profile_id && range.contains(r.current_at))
            .collect())
    }

    fn list_change_records_since(&self, since: DateTime<Utc>) -> Result<Vec<ChangeRecord>> {
        Ok(self
            .all_records()
            .into_iter()
            .filter(|r| r.current_at >= since)
            .collect())
    }

    async fn put_capture_failure(&self, failure: &CaptureFailure) -> Result<()> {
        self.failures
            .lock()
            .unwrap()
            .insert(failure.id.clone(), failure.clone());
        Ok(())
    }

    fn list_capture_failures(
        &self,
        profile_id: &str,
        range: TimeRange,
    ) -> Result<Vec<CaptureFailure>> {
        let mut failures: Vec<CaptureFailure> = self
            .all_failures()
            .into_iter()
            .filter(|f| f.profile_id == profile_id && range.contains(f.attempted_at))
            .collect();
        failures.sort_by_key(|f| f.attempted_at);
        Ok(failures)
    }

    async fn delete_change_records_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut records = self.records.lock().unwrap();
        let mut failures = self.failures.lock().unwrap();
        let before = records.len() + failures.len();
        records.retain(|_, r| r.current_at >= cutoff);
        failures.retain(|_, f| f.attempted_at >= cutoff);
        Ok(before - records.len() - failures.len())
    }

    async fn delete_change_records_in_range(&self, range: TimeRange) -> Result<usize> {
        let mut records = self.records.lock().unwrap();
        let mut failures = self.failures.lock().unwrap();
        let before = records.len() + failures.len();
        records.retain(|_, r| !range.contains(r.current_at));
        failures.retain(|_, f| !range.contains(f.attempted_at));
        Ok(before - records.len() - failures.len())
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<String, Profile>>,
}

#[async_trait]
impl ProfileRepositoryTrait for InMemoryProfileRepository {
    fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut profiles: Vec<Profile> = self.profiles.lock().unwrap().values().cloned().collect();
        profiles.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(profiles)
    }

    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        Ok(self.profiles.lock().unwrap().get(profile_id).cloned())
    }

    async fn upsert_profiles(&self, profiles: &[NewProfile]) -> Result<usize> {
        let mut stored = self.profiles.lock().unwrap();
        let mut inserted = 0;
        for new_profile in profiles {
            match stored.get_mut(&new_profile.id) {
                Some(existing) => existing.display_order = new_profile.display_order,
                None => {
                    stored.insert(
                        new_profile.id.clone(),
                        Profile {
                            id: new_profile.id.clone(),
                            name: new_profile.name.clone(),
                            url: new_profile.url.clone(),
                            display_order: new_profile.display_order,
                        },
                    );
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }
}

// ---------------------------------------------------------------------------
// Position source
// ---------------------------------------------------------------------------

/// Replays queued responses per profile; an exhausted queue repeats the
/// last response.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<HashMap<String, VecDeque<Result<Option<RawPositionSnapshot>>>>>,
    last: Mutex<HashMap<String, Option<RawPositionSnapshot>>>,
    calls: Mutex<usize>,
}

impl ScriptedSource {
    pub fn push(&self, profile_id: &str, response: Option<RawPositionSnapshot>) {
        self.responses
            .lock()
            .unwrap()
            .entry(profile_id.to_string())
            .or_default()
            .push_back(Ok(response));
    }

    pub fn push_error(&self, profile_id: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .entry(profile_id.to_string())
            .or_default()
            .push_back(Err(Error::Source(message.to_string())));
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl PositionSourceTrait for ScriptedSource {
    async fn fetch_positions(&self, profile_id: &str) -> Result<Option<RawPositionSnapshot>> {
        *self.calls.lock().unwrap() += 1;
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(profile_id)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(response)) => {
                self.last
                    .lock()
                    .unwrap()
                    .insert(profile_id.to_string(), response.clone());
                Ok(response)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().unwrap().get(profile_id).cloned().flatten()),
        }
    }
}

pub struct Fixture {
    pub source: Arc<ScriptedSource>,
    pub snapshots: Arc<InMemorySnapshotRepository>,
    pub changes: Arc<InMemoryChangeRecordRepository>,
    pub profiles: Arc<InMemoryProfileRepository>,
}

impl Default for Fixture {
    fn default() -> Self {
        Fixture {
            source: Arc::new(ScriptedSource::default()),
            snapshots: Arc::new(InMemorySnapshotRepository::default()),
            changes: Arc::new(InMemoryChangeRecordRepository::default()),
            profiles: Arc::new(InMemoryProfileRepository::default()),
        }
    }
}
