//! PostgreSQL-backed `CompletionRepository` adapter.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::UserId;
use crate::domain::ports::{CompletionRepository, CompletionRepositoryError, TaskCompletion};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::TaskCompletionRow;
use super::pool::DbPool;
use super::schema::task_completions;

/// Diesel-backed implementation of the `CompletionRepository` port.
#[derive(Clone)]
pub struct DieselCompletionRepository {
    pool: DbPool,
}

impl DieselCompletionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompletionRepository for DieselCompletionRepository {
    async fn completions_for_day(
        &self,
        user_id: &UserId,
        day: &str,
    ) -> Result<Vec<TaskCompletion>, CompletionRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, CompletionRepositoryError::connection))?;

        let rows: Vec<TaskCompletionRow> = task_completions::table
            .filter(task_completions::user_id.eq(user_id.as_uuid()))
            .filter(task_completions::day.eq(day))
            .select(TaskCompletionRow::as_select())
            .order(task_completions::completed_at.asc())
            .load(&mut conn)
            .await
            .map_err(|e| {
                map_diesel_error(
                    e,
                    CompletionRepositoryError::query,
                    CompletionRepositoryError::connection,
                )
            })?;

        Ok(rows
            .into_iter()
            .map(|row| TaskCompletion {
                task_id: row.task_id,
                completed_at: row.completed_at,
            })
            .collect())
    }
}
