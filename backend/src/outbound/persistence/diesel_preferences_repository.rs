//! PostgreSQL-backed `PreferencesRepository` adapter.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::UserId;
use crate::domain::ports::{PreferencesRepository, PreferencesRepositoryError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::user_preferences;

/// Diesel-backed implementation of the `PreferencesRepository` port.
///
/// Only the timezone column is read; the rest of the preferences row
/// belongs to the main application.
#[derive(Clone)]
pub struct DieselPreferencesRepository {
    pool: DbPool,
}

impl DieselPreferencesRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferencesRepository for DieselPreferencesRepository {
    async fn timezone_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<String>, PreferencesRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, PreferencesRepositoryError::connection))?;

        let timezone: Option<Option<String>> = user_preferences::table
            .filter(user_preferences::user_id.eq(user_id.as_uuid()))
            .select(user_preferences::timezone)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| {
                map_diesel_error(
                    e,
                    PreferencesRepositoryError::query,
                    PreferencesRepositoryError::connection,
                )
            })?;

        Ok(timezone.flatten())
    }
}
