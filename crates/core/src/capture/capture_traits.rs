use async_trait::async_trait;

use crate::errors::Result;
use crate::positions::RawPositionSnapshot;

/// Source of live position payloads.
#[async_trait]
pub trait PositionSourceTrait: Send + Sync {
    /// Fetch the current positions of a profile. `None` means the source had
    /// nothing to report for this profile right now.
    async fn fetch_positions(&self, profile_id: &str) -> Result<Option<RawPositionSnapshot>>;
}
