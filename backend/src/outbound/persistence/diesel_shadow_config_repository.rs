//! PostgreSQL-backed `ShadowConfigRepository` adapter.
//!
//! Missing rows and null columns resolve to [`ShadowConfig::default`]
//! values, so an unconfigured user never blocks the pipeline.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ShadowConfigRepository, ShadowConfigRepositoryError};
use crate::domain::{ShadowConfig, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::ShadowConfigRow;
use super::pool::DbPool;
use super::schema::shadow_config;

/// Diesel-backed implementation of the `ShadowConfigRepository` port.
#[derive(Clone)]
pub struct DieselShadowConfigRepository {
    pool: DbPool,
}

impl DieselShadowConfigRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_config(row: ShadowConfigRow) -> ShadowConfig {
    let defaults = ShadowConfig::default();
    ShadowConfig {
        enabled_race: row.enabled_race,
        base_speed: row.base_speed.unwrap_or(defaults.base_speed),
        shadow_speed_target: row.shadow_speed_target,
        max_notifications_per_day: row
            .max_notifications_per_day
            .unwrap_or(defaults.max_notifications_per_day),
        min_seconds_between_notifications: row
            .min_seconds_between_notifications
            .unwrap_or(defaults.min_seconds_between_notifications),
    }
}

#[async_trait]
impl ShadowConfigRepository for DieselShadowConfigRepository {
    async fn config_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<ShadowConfig, ShadowConfigRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, ShadowConfigRepositoryError::connection))?;

        let row: Option<ShadowConfigRow> = shadow_config::table
            .filter(shadow_config::user_id.eq(user_id.as_uuid()))
            .select(ShadowConfigRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| {
                map_diesel_error(
                    e,
                    ShadowConfigRepositoryError::query,
                    ShadowConfigRepositoryError::connection,
                )
            })?;

        Ok(row.map_or_else(ShadowConfig::default, row_to_config))
    }

    async fn racers(&self) -> Result<Vec<UserId>, ShadowConfigRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, ShadowConfigRepositoryError::connection))?;

        let ids: Vec<uuid::Uuid> = shadow_config::table
            .filter(shadow_config::enabled_race.eq(true))
            .select(shadow_config::user_id)
            .order(shadow_config::user_id.asc())
            .load(&mut conn)
            .await
            .map_err(|e| {
                map_diesel_error(
                    e,
                    ShadowConfigRepositoryError::query,
                    ShadowConfigRepositoryError::connection,
                )
            })?;

        Ok(ids.into_iter().map(UserId::from_uuid).collect())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn null_columns_resolve_to_defaults() {
        let row = ShadowConfigRow {
            enabled_race: false,
            base_speed: None,
            shadow_speed_target: None,
            max_notifications_per_day: None,
            min_seconds_between_notifications: None,
        };
        let cfg = row_to_config(row);

        assert!(!cfg.enabled_race);
        assert_eq!(cfg.base_speed, ShadowConfig::default().base_speed);
        assert_eq!(cfg.max_notifications_per_day, 10);
        assert_eq!(cfg.min_seconds_between_notifications, 900);
    }

    #[rstest]
    fn set_columns_pass_through() {
        let row = ShadowConfigRow {
            enabled_race: true,
            base_speed: Some(5.0),
            shadow_speed_target: Some(6.5),
            max_notifications_per_day: Some(3),
            min_seconds_between_notifications: Some(60),
        };
        let cfg = row_to_config(row);

        assert_eq!(cfg.base_speed, 5.0);
        assert_eq!(cfg.shadow_speed_target, Some(6.5));
        assert_eq!(cfg.max_notifications_per_day, 3);
        assert_eq!(cfg.min_seconds_between_notifications, 60);
    }
}
