//! PostgreSQL-backed `CommitRepository` adapter.
//!
//! Both writes are `INSERT ... ON CONFLICT DO UPDATE` on their day key, so
//! re-running the pipeline overwrites rather than duplicates. Every write
//! records the access level the caller passed for it.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{CommitRepository, CommitRepositoryError};
use crate::domain::{AccessLevel, DailyAggregate, DecisionKind, ProgressCommit, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CommitRow, NewCommitRow, NewDailyRow};
use super::pool::DbPool;
use super::schema::{shadow_progress_commits, shadow_progress_daily};

/// Diesel-backed implementation of the `CommitRepository` port.
#[derive(Clone)]
pub struct DieselCommitRepository {
    pool: DbPool,
}

impl DieselCommitRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_err(e: diesel::result::Error) -> CommitRepositoryError {
    map_diesel_error(
        e,
        CommitRepositoryError::query,
        CommitRepositoryError::connection,
    )
}

fn row_to_commit(row: CommitRow) -> ProgressCommit {
    ProgressCommit {
        user_id: UserId::from_uuid(row.user_id),
        day: row.day,
        delta: row.delta,
        target_today: row.target_today,
        completed_today: row.completed_today,
        decision_kind: DecisionKind::from_label(&row.decision_kind),
        payload: row.payload,
        created_at: Some(row.created_at),
    }
}

#[async_trait]
impl CommitRepository for DieselCommitRepository {
    async fn upsert_commit(
        &self,
        commit: &ProgressCommit,
        access: AccessLevel,
    ) -> Result<(), CommitRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, CommitRepositoryError::connection))?;

        let row = NewCommitRow {
            id: Uuid::new_v4(),
            user_id: *commit.user_id.as_uuid(),
            day: &commit.day,
            delta: commit.delta,
            target_today: commit.target_today,
            completed_today: commit.completed_today,
            decision_kind: commit.decision_kind.as_str(),
            payload: &commit.payload,
            access_level: access.as_str(),
        };

        diesel::insert_into(shadow_progress_commits::table)
            .values(&row)
            .on_conflict((
                shadow_progress_commits::user_id,
                shadow_progress_commits::day,
            ))
            .do_update()
            .set((
                shadow_progress_commits::delta.eq(excluded(shadow_progress_commits::delta)),
                shadow_progress_commits::target_today
                    .eq(excluded(shadow_progress_commits::target_today)),
                shadow_progress_commits::completed_today
                    .eq(excluded(shadow_progress_commits::completed_today)),
                shadow_progress_commits::decision_kind
                    .eq(excluded(shadow_progress_commits::decision_kind)),
                shadow_progress_commits::payload.eq(excluded(shadow_progress_commits::payload)),
                shadow_progress_commits::access_level
                    .eq(excluded(shadow_progress_commits::access_level)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_err)
    }

    async fn find_commit(
        &self,
        user_id: &UserId,
        day: &str,
    ) -> Result<Option<ProgressCommit>, CommitRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, CommitRepositoryError::connection))?;

        let row: Option<CommitRow> = shadow_progress_commits::table
            .filter(shadow_progress_commits::user_id.eq(user_id.as_uuid()))
            .filter(shadow_progress_commits::day.eq(day))
            .select(CommitRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_err)?;

        Ok(row.map(row_to_commit))
    }

    async fn upsert_daily(
        &self,
        row: &DailyAggregate,
        access: AccessLevel,
    ) -> Result<(), CommitRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, CommitRepositoryError::connection))?;

        let metrics = row.metrics;
        let new_row = NewDailyRow {
            user_id: *row.user_id.as_uuid(),
            date: &row.date,
            user_distance: row.user_distance,
            shadow_distance: row.shadow_distance,
            lead: row.lead,
            shadow_speed_target: row.shadow_speed_target,
            time_saved_minutes: metrics.map(|m| m.time_saved_minutes),
            pace_consistency: metrics.and_then(|m| m.pace_consistency),
            delta_now: metrics.map(|m| m.delta_now),
            user_speed_now: metrics.map(|m| m.user_speed_now),
            shadow_speed_now: metrics.map(|m| m.shadow_speed_now),
            shadow_distance_now: metrics.map(|m| m.shadow_distance_now),
            access_level: access.as_str(),
            last_computed_at: row.last_computed_at,
        };

        diesel::insert_into(shadow_progress_daily::table)
            .values(&new_row)
            .on_conflict((
                shadow_progress_daily::user_id,
                shadow_progress_daily::date,
            ))
            .do_update()
            .set((
                shadow_progress_daily::user_distance
                    .eq(excluded(shadow_progress_daily::user_distance)),
                shadow_progress_daily::shadow_distance
                    .eq(excluded(shadow_progress_daily::shadow_distance)),
                shadow_progress_daily::lead.eq(excluded(shadow_progress_daily::lead)),
                shadow_progress_daily::shadow_speed_target
                    .eq(excluded(shadow_progress_daily::shadow_speed_target)),
                shadow_progress_daily::time_saved_minutes
                    .eq(excluded(shadow_progress_daily::time_saved_minutes)),
                shadow_progress_daily::pace_consistency
                    .eq(excluded(shadow_progress_daily::pace_consistency)),
                shadow_progress_daily::delta_now.eq(excluded(shadow_progress_daily::delta_now)),
                shadow_progress_daily::user_speed_now
                    .eq(excluded(shadow_progress_daily::user_speed_now)),
                shadow_progress_daily::shadow_speed_now
                    .eq(excluded(shadow_progress_daily::shadow_speed_now)),
                shadow_progress_daily::shadow_distance_now
                    .eq(excluded(shadow_progress_daily::shadow_distance_now)),
                shadow_progress_daily::access_level
                    .eq(excluded(shadow_progress_daily::access_level)),
                shadow_progress_daily::last_computed_at
                    .eq(excluded(shadow_progress_daily::last_computed_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_err)
    }
}
