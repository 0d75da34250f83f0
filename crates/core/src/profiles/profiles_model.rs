//! Profile domain models.

use serde::{Deserialize, Serialize};

/// A monitored trading profile, identified by its public slug.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    /// Position in the profile list; lower sorts first.
    pub display_order: i32,
}

/// Input model for registering a profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub display_order: i32,
}

/// Parses a profile list: one slug or profile URL per line.
///
/// Blank lines and lines starting with `#` are skipped. URLs are reduced to
/// their last path segment. Duplicates keep their first position.
pub fn parse_profile_list(text: &str) -> Vec<NewProfile> {
    let mut profiles: Vec<NewProfile> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let is_url = line.contains("://");
        let slug = line
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(line)
            .to_string();
        if slug.is_empty() || profiles.iter().any(|p| p.id == slug) {
            continue;
        }
        profiles.push(NewProfile {
            name: slug.clone(),
            url: is_url.then(|| line.to_string()),
            display_order: profiles.len() as i32,
            id: slug,
        });
    }
    profiles
}
