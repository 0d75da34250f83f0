use async_trait::async_trait;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

use super::{parse_profile_list, Profile, ProfileRepositoryTrait, ProfileServiceTrait};
use crate::errors::Result;

pub struct ProfileService {
    repository: Arc<dyn ProfileRepositoryTrait>,
}

impl ProfileService {
    pub fn new(repository: Arc<dyn ProfileRepositoryTrait>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl ProfileServiceTrait for ProfileService {
    fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.repository.list_profiles()
    }

    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        self.repository.get_profile(profile_id)
    }

    async fn sync_from_text(&self, text: &str) -> Result<usize> {
        let profiles = parse_profile_list(text);
        if profiles.is_empty() {
            return Ok(0);
        }
        let inserted = self.repository.upsert_profiles(&profiles).await?;
        if inserted > 0 {
            info!("Registered {} new profiles", inserted);
        }
        Ok(inserted)
    }

    /// A missing file is not an error; there is simply nothing to sync.
    async fn sync_from_file(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            warn!("Profile list {} not found, skipping sync", path.display());
            return Ok(0);
        }
        let text = tokio::fs::read_to_string(path).await?;
        self.sync_from_text(&text).await
    }
}
