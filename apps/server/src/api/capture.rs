use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tradewatch_core::capture::{CaptureReport, SessionChange, SessionStatus};

use crate::{api::profiles::require_profile, error::ApiResult, main_lib::AppState};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CaptureTarget {
    profile_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionChangeView {
    profile_id: String,
    change: SessionChange,
}

/// The requested profile, or every known profile when none is named.
fn target_profiles(state: &AppState, target: Option<Json<CaptureTarget>>) -> ApiResult<Vec<String>> {
    let target = target.map(|Json(t)| t).unwrap_or_default();
    match target.profile_id {
        Some(profile_id) => Ok(vec![require_profile(state, &profile_id)?.id]),
        None => Ok(state
            .profile_service
            .list_profiles()?
            .into_iter()
            .map(|p| p.id)
            .collect()),
    }
}

async fn start_capture(
    State(state): State<Arc<AppState>>,
    target: Option<Json<CaptureTarget>>,
) -> ApiResult<Json<Vec<SessionChangeView>>> {
    let mut changes = Vec::new();
    for profile_id in target_profiles(&state, target)? {
        let change = state.capture_scheduler.start(&profile_id).await;
        changes.push(SessionChangeView { profile_id, change });
    }
    Ok(Json(changes))
}

async fn stop_capture(
    State(state): State<Arc<AppState>>,
    target: Option<Json<CaptureTarget>>,
) -> ApiResult<Json<Vec<SessionChangeView>>> {
    let mut changes = Vec::new();
    for profile_id in target_profiles(&state, target)? {
        let change = state.capture_scheduler.stop(&profile_id).await;
        changes.push(SessionChangeView { profile_id, change });
    }
    Ok(Json(changes))
}

async fn capture_status(State(state): State<Arc<AppState>>) -> Json<Vec<SessionStatus>> {
    Json(state.capture_scheduler.status().await)
}

async fn run_capture(
    State(state): State<Arc<AppState>>,
    target: Option<Json<CaptureTarget>>,
) -> ApiResult<Json<CaptureReport>> {
    let profile_ids = target_profiles(&state, target)?;
    let report = state
        .capture_service
        .capture_all(&profile_ids, Utc::now())
        .await;
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/capture/start", post(start_capture))
        .route("/capture/stop", post(stop_capture))
        .route("/capture/status", get(capture_status))
        .route("/capture/run", post(run_capture))
}
