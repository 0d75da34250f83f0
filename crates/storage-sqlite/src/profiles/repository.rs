use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;

use super::model::ProfileDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::profiles;
use crate::schema::profiles::dsl::*;
use tradewatch_core::profiles::{NewProfile, Profile, ProfileRepositoryTrait};
use tradewatch_core::utils::time_utils::format_timestamp;
use tradewatch_core::Result;

pub struct ProfileRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ProfileRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        ProfileRepository { pool, writer }
    }
}

#[async_trait]
impl ProfileRepositoryTrait for ProfileRepository {
    fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = profiles
            .order((display_order.asc(), id.asc()))
            .select(ProfileDB::as_select())
            .load(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    fn get_profile(&self, profile_id: &str) -> Result<Option<Profile>> {
        let mut conn = get_connection(&self.pool)?;
        let row = profiles
            .find(profile_id)
            .select(ProfileDB::as_select())
            .first(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(Profile::from))
    }

    async fn upsert_profiles(&self, new_profiles: &[NewProfile]) -> Result<usize> {
        let now = format_timestamp(Utc::now());
        let rows: Vec<ProfileDB> = new_profiles
            .iter()
            .map(|p| ProfileDB::from_new(p, now.clone()))
            .collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut inserted = 0;
                for row in rows {
                    let updated = diesel::update(profiles.find(row.id.as_str()))
                        .set(display_order.eq(row.display_order))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                    if updated == 0 {
                        inserted += diesel::insert_into(profiles::table)
                            .values(&row)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                }
                Ok(inserted)
            })
            .await
    }
}
