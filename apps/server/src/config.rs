use std::{net::SocketAddr, path::PathBuf, time::Duration};

use chrono_tz::Tz;
use tradewatch_core::constants::{DEFAULT_CAPTURE_INTERVAL_SECS, DEFAULT_RETENTION_DAYS};
use tradewatch_core::errors::{Error, Result};
use tradewatch_core::utils::time_utils::DEFAULT_DISPLAY_TZ;

const DEFAULT_SOURCE_URL_TEMPLATE: &str =
    "https://oxide.sensibull.com/v1/compute/verified_by_sensibull/live_positions/snapshot/{slug}";

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub profiles_file: PathBuf,
    /// Live-positions URL with a `{slug}` placeholder.
    pub source_url_template: String,
    pub capture_interval: Duration,
    pub retention_days: i64,
    pub display_tz: Tz,
    pub verify_diffs: bool,
    pub autostart_capture: bool,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 6060)),
            db_path: "./db/tradewatch.db".into(),
            profiles_file: PathBuf::from("./profiles.txt"),
            source_url_template: DEFAULT_SOURCE_URL_TEMPLATE.into(),
            capture_interval: Duration::from_secs(DEFAULT_CAPTURE_INTERVAL_SECS),
            retention_days: DEFAULT_RETENTION_DAYS,
            display_tz: DEFAULT_DISPLAY_TZ,
            verify_diffs: false,
            autostart_capture: false,
            cors_allow: vec!["*".into()],
            request_timeout: Duration::from_millis(30000),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env_var(name) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidConfigValue(format!("Invalid {}: '{}'", name, raw))),
        None => Ok(None),
    }
}

fn parse_flag(name: &str) -> Result<Option<bool>> {
    match env_var(name) {
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(Error::InvalidConfigValue(format!(
                "Invalid {}: '{}'",
                name, raw
            ))),
        },
        None => Ok(None),
    }
}

impl Config {
    /// Reads `TW_*` variables, loading `.env` first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let source_url_template = env_var("TW_SOURCE_URL_TEMPLATE")
            .unwrap_or(defaults.source_url_template);
        if !source_url_template.contains("{slug}") {
            return Err(Error::InvalidConfigValue(
                "TW_SOURCE_URL_TEMPLATE must contain a {slug} placeholder".to_string(),
            ));
        }

        let retention_days = parse_var("TW_RETENTION_DAYS")?.unwrap_or(defaults.retention_days);
        if retention_days <= 0 {
            return Err(Error::InvalidConfigValue(
                "TW_RETENTION_DAYS must be positive".to_string(),
            ));
        }

        let interval_secs: u64 =
            parse_var("TW_CAPTURE_INTERVAL_SECS")?.unwrap_or(DEFAULT_CAPTURE_INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(Error::InvalidConfigValue(
                "TW_CAPTURE_INTERVAL_SECS must be positive".to_string(),
            ));
        }

        let cors_allow = env_var("TW_CORS_ALLOW_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_allow);

        let timeout_ms: u64 = parse_var("TW_REQUEST_TIMEOUT_MS")?.unwrap_or(30000);

        Ok(Self {
            listen_addr: parse_var("TW_LISTEN_ADDR")?.unwrap_or(defaults.listen_addr),
            db_path: env_var("TW_DB_PATH").unwrap_or(defaults.db_path),
            profiles_file: env_var("TW_PROFILES_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.profiles_file),
            source_url_template,
            capture_interval: Duration::from_secs(interval_secs),
            retention_days,
            display_tz: parse_var("TW_DISPLAY_TZ")?.unwrap_or(defaults.display_tz),
            verify_diffs: parse_flag("TW_VERIFY_DIFFS")?.unwrap_or(defaults.verify_diffs),
            autostart_capture: parse_flag("TW_AUTOSTART_CAPTURE")?
                .unwrap_or(defaults.autostart_capture),
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}
