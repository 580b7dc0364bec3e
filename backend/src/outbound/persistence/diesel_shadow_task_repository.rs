//! PostgreSQL-backed `ShadowTaskRepository` adapter.
//!
//! Instance and pass writes are `INSERT ... ON CONFLICT DO NOTHING` on
//! their natural keys, so re-materialising a day is idempotent.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{
    ShadowPass, ShadowProfile, ShadowTaskRepository, ShadowTaskRepositoryError,
};
use crate::domain::{MirroredTask, PlannedInstance, TimeAnchor, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewInstanceRow, NewPassRow, ShadowProfileRow, ShadowTaskRow};
use super::pool::DbPool;
use super::schema::{shadow_passes, shadow_profiles, shadow_task_instances, shadow_tasks};

/// Diesel-backed implementation of the `ShadowTaskRepository` port.
#[derive(Clone)]
pub struct DieselShadowTaskRepository {
    pool: DbPool,
}

impl DieselShadowTaskRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_err(e: diesel::result::Error) -> ShadowTaskRepositoryError {
    map_diesel_error(
        e,
        ShadowTaskRepositoryError::query,
        ShadowTaskRepositoryError::connection,
    )
}

fn row_to_mirror(row: ShadowTaskRow) -> MirroredTask {
    MirroredTask {
        shadow_task_id: row.id,
        title: row.title,
        anchor: row
            .anchor
            .as_deref()
            .map(|label| TimeAnchor::from_label(Some(label))),
        order_hint: row.order_hint,
        created_at: row.created_at,
    }
}

#[async_trait]
impl ShadowTaskRepository for DieselShadowTaskRepository {
    async fn profile_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ShadowProfile>, ShadowTaskRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, ShadowTaskRepositoryError::connection))?;

        let row: Option<ShadowProfileRow> = shadow_profiles::table
            .filter(shadow_profiles::user_id.eq(user_id.as_uuid()))
            .select(ShadowProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_err)?;

        Ok(row.map(|row| ShadowProfile {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
        }))
    }

    async fn profiles(&self) -> Result<Vec<ShadowProfile>, ShadowTaskRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, ShadowTaskRepositoryError::connection))?;

        let rows: Vec<ShadowProfileRow> = shadow_profiles::table
            .select(ShadowProfileRow::as_select())
            .order(shadow_profiles::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_err)?;

        Ok(rows
            .into_iter()
            .map(|row| ShadowProfile {
                id: row.id,
                user_id: UserId::from_uuid(row.user_id),
            })
            .collect())
    }

    async fn active_mirrors(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<MirroredTask>, ShadowTaskRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, ShadowTaskRepositoryError::connection))?;

        let rows: Vec<ShadowTaskRow> = shadow_tasks::table
            .filter(shadow_tasks::shadow_profile_id.eq(profile_id))
            .filter(shadow_tasks::active.eq(true))
            .select(ShadowTaskRow::as_select())
            .order(shadow_tasks::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(map_err)?;

        Ok(rows.into_iter().map(row_to_mirror).collect())
    }

    async fn insert_instances(
        &self,
        instances: &[PlannedInstance],
    ) -> Result<usize, ShadowTaskRepositoryError> {
        if instances.is_empty() {
            return Ok(0);
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, ShadowTaskRepositoryError::connection))?;

        let rows: Vec<NewInstanceRow<'_>> = instances
            .iter()
            .map(|instance| NewInstanceRow {
                id: Uuid::new_v4(),
                shadow_task_id: instance.shadow_task_id,
                planned_start_at: instance.planned_start_at,
                planned_end_at: instance.planned_end_at,
                planned_date_local: &instance.planned_date_local,
            })
            .collect();

        diesel::insert_into(shadow_task_instances::table)
            .values(&rows)
            .on_conflict((
                shadow_task_instances::shadow_task_id,
                shadow_task_instances::planned_date_local,
            ))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_err)
    }

    async fn upsert_passes(&self, passes: &[ShadowPass]) -> Result<(), ShadowTaskRepositoryError> {
        if passes.is_empty() {
            return Ok(());
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, ShadowTaskRepositoryError::connection))?;

        let rows: Vec<NewPassRow<'_>> = passes
            .iter()
            .map(|pass| NewPassRow {
                user_id: *pass.user_id.as_uuid(),
                task_id: pass.task_id,
                date: &pass.date,
            })
            .collect();

        diesel::insert_into(shadow_passes::table)
            .values(&rows)
            .on_conflict((
                shadow_passes::user_id,
                shadow_passes::task_id,
                shadow_passes::date,
            ))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_err)
    }
}
