//! Background jobs for the server: retention cleanup and capture autostart.

use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

use crate::main_lib::AppState;

/// Cleanup runs hourly; retention is measured in days.
const CLEANUP_INTERVAL_SECS: u64 = 60 * 60;

/// Starts the periodic retention cleanup. The first pass runs immediately.
pub fn start_retention_scheduler(state: Arc<AppState>) {
    tokio::spawn(async move {
        info!(
            "Retention scheduler started ({} days kept)",
            state.retention_service.retention_days()
        );
        let mut cleanup_interval = interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));
        loop {
            cleanup_interval.tick().await;
            run_retention_cleanup(&state).await;
        }
    });
}

async fn run_retention_cleanup(state: &Arc<AppState>) {
    match state.retention_service.cleanup(chrono::Utc::now()).await {
        Ok(report) => {
            if report.snapshots_deleted > 0 || report.records_deleted > 0 {
                info!(
                    "Retention cleanup removed {} snapshots and {} records",
                    report.snapshots_deleted, report.records_deleted
                );
            }
        }
        Err(e) => warn!("Retention cleanup failed: {}", e),
    }
}

/// Starts a capture session for every known profile.
pub async fn autostart_capture(state: &Arc<AppState>) {
    let profiles = match state.profile_service.list_profiles() {
        Ok(profiles) => profiles,
        Err(e) => {
            warn!("Capture autostart skipped, profiles unavailable: {}", e);
            return;
        }
    };
    for profile in &profiles {
        state.capture_scheduler.start(&profile.id).await;
    }
    info!("Capture autostarted for {} profiles", profiles.len());
}
