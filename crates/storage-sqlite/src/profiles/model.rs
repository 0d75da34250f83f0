use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use tradewatch_core::profiles::{NewProfile, Profile};

#[derive(
    Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct ProfileDB {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
    pub display_order: i32,
    pub created_at: String,
}

impl From<ProfileDB> for Profile {
    fn from(db: ProfileDB) -> Self {
        Self {
            id: db.id,
            name: db.name,
            url: db.url,
            display_order: db.display_order,
        }
    }
}

impl ProfileDB {
    pub fn from_new(profile: &NewProfile, created_at: String) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            url: profile.url.clone(),
            display_order: profile.display_order,
            created_at,
        }
    }
}
