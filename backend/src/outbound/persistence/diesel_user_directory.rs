//! PostgreSQL-backed `UserDirectory` adapter.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::UserId;
use crate::domain::ports::{UserDirectory, UserDirectoryError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;
use super::schema::app_users;

/// Diesel-backed implementation of the `UserDirectory` port.
///
/// Unknown accounts read as non-admin rather than erroring; the admin gate
/// turns that into a 403.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn is_sysadmin(&self, user_id: &UserId) -> Result<bool, UserDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, UserDirectoryError::connection))?;

        let flag: Option<bool> = app_users::table
            .filter(app_users::id.eq(user_id.as_uuid()))
            .select(app_users::is_sys_admin)
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| {
                map_diesel_error(
                    e,
                    UserDirectoryError::query,
                    UserDirectoryError::connection,
                )
            })?;

        Ok(flag.unwrap_or(false))
    }
}
