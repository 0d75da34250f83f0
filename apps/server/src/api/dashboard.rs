use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tradewatch_core::{constants::DEFAULT_DASHBOARD_DAYS, dashboard::ActivityMatrix};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

#[derive(Deserialize)]
struct DashboardQuery {
    days: Option<usize>,
}

async fn get_dashboard(
    Query(query): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ActivityMatrix>> {
    let days = query.days.unwrap_or(DEFAULT_DASHBOARD_DAYS);
    if days == 0 {
        return Err(ApiError::BadRequest("days must be at least 1".to_string()));
    }
    let matrix = state.dashboard_service.activity_matrix(days, Utc::now())?;
    Ok(Json(matrix))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(get_dashboard))
}
