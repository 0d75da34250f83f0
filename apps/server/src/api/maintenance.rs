use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::delete,
    Json, Router,
};
use chrono::NaiveDate;
use tradewatch_core::retention::DeletionReport;

use crate::{error::ApiResult, main_lib::AppState};

async fn delete_day(
    Path(day): Path<NaiveDate>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DeletionReport>> {
    tracing::info!("Deleting all captured data for {}", day);
    let report = state.retention_service.delete_day(day).await?;
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/days/{date}", delete(delete_day))
}
