use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use tradewatch_core::{
    capture::{CaptureScheduler, CaptureService, HttpPositionSource, PositionSourceTrait},
    changelog::{ChangeLogBuilder, ChangeRecordRepositoryTrait},
    dashboard::DashboardService,
    pnl::PnlService,
    positions::SnapshotRepositoryTrait,
    profiles::{ProfileService, ProfileServiceTrait},
    retention::RetentionService,
    utils::time_utils::MarketHours,
};
use tradewatch_storage_sqlite::{
    changes::ChangeRecordRepository,
    db::{self, write_actor},
    profiles::ProfileRepository,
    snapshots::SnapshotRepository,
};

use crate::config::Config;

pub struct AppState {
    pub profile_service: Arc<dyn ProfileServiceTrait>,
    pub capture_service: Arc<CaptureService>,
    pub capture_scheduler: Arc<CaptureScheduler>,
    pub changelog: Arc<ChangeLogBuilder>,
    pub pnl_service: Arc<PnlService>,
    pub dashboard_service: Arc<DashboardService>,
    pub retention_service: Arc<RetentionService>,
    pub snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    pub change_repository: Arc<dyn ChangeRecordRepositoryTrait>,
    pub profiles_file: PathBuf,
}

pub fn init_tracing() {
    let log_format = std::env::var("TW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `init` also installs the log-to-tracing bridge for the library crates.
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let source = Arc::new(HttpPositionSource::new(config.source_url_template.clone()));
    build_state_with_source(config, source).await
}

/// Wires repositories and services around the given position source.
pub async fn build_state_with_source(
    config: &Config,
    source: Arc<dyn PositionSourceTrait>,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let profile_repository = Arc::new(ProfileRepository::new(pool.clone(), writer.clone()));
    let snapshot_repository: Arc<dyn SnapshotRepositoryTrait> =
        Arc::new(SnapshotRepository::new(pool.clone(), writer.clone()));
    let change_repository: Arc<dyn ChangeRecordRepositoryTrait> =
        Arc::new(ChangeRecordRepository::new(pool.clone(), writer.clone()));

    let profile_service: Arc<dyn ProfileServiceTrait> =
        Arc::new(ProfileService::new(profile_repository.clone()));
    let synced = profile_service
        .sync_from_file(&config.profiles_file)
        .await?;
    tracing::info!(
        "Profile list {} synced ({} new)",
        config.profiles_file.display(),
        synced
    );

    let capture_service = Arc::new(
        CaptureService::new(source, snapshot_repository.clone(), change_repository.clone())
            .with_market_hours(MarketHours::with_tz(config.display_tz))
            .with_verification(config.verify_diffs),
    );
    let capture_scheduler = Arc::new(CaptureScheduler::new(
        capture_service.clone(),
        config.capture_interval,
    ));

    let changelog =
        Arc::new(ChangeLogBuilder::new(change_repository.clone()).with_timezone(config.display_tz));
    let pnl_service =
        Arc::new(PnlService::new(snapshot_repository.clone()).with_timezone(config.display_tz));
    let dashboard_service = Arc::new(
        DashboardService::new(
            profile_repository,
            snapshot_repository.clone(),
            change_repository.clone(),
        )
        .with_timezone(config.display_tz)
        .with_lookback_days(config.retention_days),
    );
    let retention_service = Arc::new(
        RetentionService::new(snapshot_repository.clone(), change_repository.clone())
            .with_retention_days(config.retention_days)?
            .with_timezone(config.display_tz),
    );

    Ok(Arc::new(AppState {
        profile_service,
        capture_service,
        capture_scheduler,
        changelog,
        pnl_service,
        dashboard_service,
        retention_service,
        snapshot_repository,
        change_repository,
        profiles_file: config.profiles_file.clone(),
    }))
}
