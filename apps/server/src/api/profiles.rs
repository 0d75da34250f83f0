use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Serialize;
use tradewatch_core::{
    changelog::TimelineEntry, dashboard::DailyLogView, pnl::DailyPnlMetrics, profiles::Profile,
};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SyncResponse {
    inserted: usize,
    profiles: Vec<Profile>,
}

/// Resolves a profile id or fails with 404.
pub(crate) fn require_profile(state: &AppState, profile_id: &str) -> ApiResult<Profile> {
    state
        .profile_service
        .get_profile(profile_id)?
        .ok_or(ApiError::NotFound)
}

async fn list_profiles(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Profile>>> {
    let profiles = state.profile_service.list_profiles()?;
    Ok(Json(profiles))
}

async fn sync_profiles(State(state): State<Arc<AppState>>) -> ApiResult<Json<SyncResponse>> {
    let inserted = state
        .profile_service
        .sync_from_file(&state.profiles_file)
        .await?;
    let profiles = state.profile_service.list_profiles()?;
    Ok(Json(SyncResponse { inserted, profiles }))
}

async fn get_timeline(
    Path((profile_id, day)): Path<(String, NaiveDate)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TimelineEntry>>> {
    require_profile(&state, &profile_id)?;
    let entries = state.changelog.timeline(&profile_id, day)?;
    Ok(Json(entries))
}

async fn get_daily_log(
    Path((profile_id, day)): Path<(String, NaiveDate)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DailyLogView>> {
    require_profile(&state, &profile_id)?;
    let view = state.dashboard_service.daily_log(&profile_id, day)?;
    Ok(Json(view))
}

async fn get_daily_metrics(
    Path((profile_id, day)): Path<(String, NaiveDate)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DailyPnlMetrics>> {
    require_profile(&state, &profile_id)?;
    let metrics = state.pnl_service.daily_metrics(&profile_id, day)?;
    Ok(Json(metrics))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profiles", get(list_profiles))
        .route("/profiles/sync", post(sync_profiles))
        .route("/profiles/{id}/days/{date}/timeline", get(get_timeline))
        .route("/profiles/{id}/days/{date}/log", get(get_daily_log))
        .route("/profiles/{id}/days/{date}/metrics", get(get_daily_metrics))
}
