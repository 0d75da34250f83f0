use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tradewatch_core::{ChangeRecord, Position};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeDetail {
    summary: String,
    record: ChangeRecord,
    /// Holdings of the snapshot the record leads to. Empty once that
    /// snapshot has been cleaned up.
    positions: Vec<Position>,
}

async fn get_change(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ChangeDetail>> {
    let record = state
        .change_repository
        .get_change_record(&id)?
        .ok_or(ApiError::NotFound)?;
    let positions = state
        .snapshot_repository
        .get_snapshot(&record.profile_id, record.current_at)?
        .map(|snapshot| snapshot.positions().values().cloned().collect())
        .unwrap_or_default();
    Ok(Json(ChangeDetail {
        summary: record.summary(),
        record,
        positions,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/changes/{id}", get(get_change))
}
