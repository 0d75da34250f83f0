use async_trait::async_trait;
use std::path::Path;

use super::{NewProfile, Profile};
use crate::errors::Result;

/// Trait for profile repository operations
#[async_trait]
pub trait ProfileRepositoryTrait: Send + Sync {
    /// All profiles ordered by display order, then id.
    fn list_profiles(&self) -> Result<Vec<Profile>>;
    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>>;
    /// Inserts unknown profiles and updates the display order of known ones.
    /// Returns the number of newly inserted profiles.
    async fn upsert_profiles(&self, profiles: &[NewProfile]) -> Result<usize>;
}

/// Trait for profile service operations
#[async_trait]
pub trait ProfileServiceTrait: Send + Sync {
    fn list_profiles(&self) -> Result<Vec<Profile>>;
    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>>;
    async fn sync_from_text(&self, text: &str) -> Result<usize>;
    async fn sync_from_file(&self, path: &Path) -> Result<usize>;
}
