//! Per-profile capture sessions.
//!
//! A session is created when capture starts for a profile and torn down when
//! it stops. The scheduler owns all sessions; there is no global running flag.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::{CaptureOutcome, CaptureService};

/// Queryable state of one capture session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub profile_id: String,
    pub started_at: DateTime<Utc>,
    pub last_capture_at: Option<DateTime<Utc>>,
    pub captures: u64,
    pub failures: u64,
    pub last_error: Option<String>,
    pub running: bool,
}

impl SessionStatus {
    fn new(profile_id: &str, started_at: DateTime<Utc>) -> Self {
        SessionStatus {
            profile_id: profile_id.to_string(),
            started_at,
            last_capture_at: None,
            captures: 0,
            failures: 0,
            last_error: None,
            running: true,
        }
    }
}

/// Outcome of a start or stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionChange {
    Started,
    AlreadyRunning,
    Stopped,
    NotRunning,
}

/// A running capture loop for one profile.
pub struct CaptureSession {
    profile_id: String,
    status: Arc<RwLock<SessionStatus>>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CaptureSession {
    /// Spawns the capture loop. The first capture runs immediately.
    pub fn spawn(service: Arc<CaptureService>, profile_id: &str, every: Duration) -> Self {
        let status = Arc::new(RwLock::new(SessionStatus::new(profile_id, Utc::now())));
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task_status = status.clone();
        let task_profile = profile_id.to_string();
        let handle = tokio::spawn(async move {
            info!("Capture session started for {}", task_profile);
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = Utc::now();
                        let result = service.capture_or_record_failure(&task_profile, now).await;
                        record_tick(&task_status, now, result);
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            write_status(&task_status).running = false;
            info!("Capture session stopped for {}", task_profile);
        });

        CaptureSession {
            profile_id: profile_id.to_string(),
            status,
            shutdown,
            handle,
        }
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn status(&self) -> SessionStatus {
        match self.status.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signals the loop and waits for it to exit. An in-flight capture is
    /// allowed to finish.
    pub async fn stop(self) -> SessionStatus {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("Capture session for {} ended abnormally: {}", self.profile_id, e);
        }
        let mut status = write_status(&self.status);
        status.running = false;
        status.clone()
    }
}

fn write_status(status: &RwLock<SessionStatus>) -> std::sync::RwLockWriteGuard<'_, SessionStatus> {
    match status.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn record_tick(
    status: &RwLock<SessionStatus>,
    now: DateTime<Utc>,
    result: std::result::Result<CaptureOutcome, crate::changelog::CaptureFailure>,
) {
    let mut status = write_status(status);
    match result {
        Ok(CaptureOutcome::Recorded(_)) => {
            status.captures += 1;
            status.last_capture_at = Some(now);
        }
        Ok(outcome) => debug!("{}: {:?}", status.profile_id, outcome),
        Err(failure) => {
            status.failures += 1;
            status.last_error = Some(failure.reason);
        }
    }
}

/// Owns the capture sessions of all profiles.
pub struct CaptureScheduler {
    service: Arc<CaptureService>,
    every: Duration,
    sessions: Mutex<HashMap<String, CaptureSession>>,
}

impl CaptureScheduler {
    pub fn new(service: Arc<CaptureService>, every: Duration) -> Self {
        Self {
            service,
            every,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.every
    }

    pub async fn start(&self, profile_id: &str) -> SessionChange {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(profile_id) {
            if session.is_running() {
                return SessionChange::AlreadyRunning;
            }
        }
        let session = CaptureSession::spawn(self.service.clone(), profile_id, self.every);
        sessions.insert(profile_id.to_string(), session);
        SessionChange::Started
    }

    pub async fn stop(&self, profile_id: &str) -> SessionChange {
        let session = self.sessions.lock().await.remove(profile_id);
        match session {
            Some(session) => {
                session.stop().await;
                SessionChange::Stopped
            }
            None => SessionChange::NotRunning,
        }
    }

    /// Stops every session and returns the ids that were stopped, sorted.
    pub async fn stop_all(&self) -> Vec<String> {
        let drained: Vec<CaptureSession> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().map(|(_, session)| session).collect()
        };
        let mut stopped = Vec::with_capacity(drained.len());
        for session in drained {
            stopped.push(session.profile_id().to_string());
            session.stop().await;
        }
        stopped.sort();
        stopped
    }

    /// Status of every session, sorted by profile id.
    pub async fn status(&self) -> Vec<SessionStatus> {
        let sessions = self.sessions.lock().await;
        let mut statuses: Vec<SessionStatus> = sessions
            .values()
            .map(|session| {
                let mut status = session.status();
                status.running = session.is_running();
                status
            })
            .collect();
        statuses.sort_by(|a, b| a.profile_id.cmp(&b.profile_id));
        statuses
    }

    pub async fn is_running(&self, profile_id: &str) -> bool {
        self.sessions
            .lock()
            .await
            .get(profile_id)
            .is_some_and(CaptureSession::is_running)
    }
}
