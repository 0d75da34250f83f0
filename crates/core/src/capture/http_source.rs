//! Live-positions source over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use super::PositionSourceTrait;
use crate::errors::{Error, Result};
use crate::positions::RawPositionSnapshot;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const SLUG_PLACEHOLDER: &str = "{slug}";

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct LivePositionsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    payload: Option<LivePositionsPayload>,
}

#[derive(Debug, Deserialize)]
struct LivePositionsPayload {
    #[serde(default)]
    position_snapshot_data: Option<RawPositionSnapshot>,
}

/// Parses a live-positions response body.
///
/// A response flagged unsuccessful yields `None`; a successful one without
/// snapshot data yields an empty snapshot.
pub fn parse_response(body: &str) -> Result<Option<RawPositionSnapshot>> {
    let response: LivePositionsResponse = serde_json::from_str(body)
        .map_err(|e| Error::Source(format!("Malformed live-positions response: {}", e)))?;
    if !response.success {
        return Ok(None);
    }
    Ok(Some(
        response
            .payload
            .and_then(|p| p.position_snapshot_data)
            .unwrap_or_default(),
    ))
}

/// Fetches positions from a URL template containing a `{slug}` placeholder.
pub struct HttpPositionSource {
    client: Client,
    url_template: String,
}

impl HttpPositionSource {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self::with_timeout(url_template, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url_template: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    pub fn url_for(&self, profile_id: &str) -> String {
        self.url_template.replace(SLUG_PLACEHOLDER, profile_id)
    }
}

#[async_trait]
impl PositionSourceTrait for HttpPositionSource {
    async fn fetch_positions(&self, profile_id: &str) -> Result<Option<RawPositionSnapshot>> {
        let url = self.url_for(profile_id);
        debug!("Fetching live positions from {}", url);

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Source(format!("Request for {} timed out", profile_id))
                } else {
                    Error::Source(format!("Request for {} failed: {}", profile_id, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Live positions for {} returned HTTP {}", profile_id, status);
            return Err(Error::Source(format!(
                "HTTP {} for profile {}",
                status, profile_id
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Source(format!("Failed to read response body: {}", e)))?;
        parse_response(&body)
    }
}
