//! PostgreSQL-backed `TaskRepository` adapter.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ScheduledEvent, TaskRepository, TaskRepositoryError};
use crate::domain::{AnchoredTask, TimeAnchor, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{EventRow, TaskAnchorRow};
use super::pool::DbPool;
use super::schema::{events, tasks};

/// Owner-type discriminator for tasks created by the user themselves.
const OWNER_TYPE_USER: &str = "user";

/// Upper bound on calendar events consulted per user.
const EVENT_LIMIT: i64 = 100;

/// Diesel-backed implementation of the `TaskRepository` port.
#[derive(Clone)]
pub struct DieselTaskRepository {
    pool: DbPool,
}

impl DieselTaskRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_anchored(row: TaskAnchorRow) -> AnchoredTask {
    AnchoredTask {
        id: row.id,
        anchor: row
            .anchor
            .as_deref()
            .map(|label| TimeAnchor::from_label(Some(label))),
        order_hint: row.order_hint,
        created_at: row.created_at,
    }
}

/// Events with no linked task or no usable due time carry no override.
fn row_to_event(row: EventRow) -> Option<ScheduledEvent> {
    let task_id = row.routine_item_id?;
    let due_at = row.due_end.or(row.due_start)?;
    Some(ScheduledEvent { task_id, due_at })
}

#[async_trait]
impl TaskRepository for DieselTaskRepository {
    async fn filter_user_owned(&self, task_ids: &[Uuid]) -> Result<Vec<Uuid>, TaskRepositoryError> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, TaskRepositoryError::connection))?;

        tasks::table
            .filter(tasks::id.eq_any(task_ids))
            .filter(tasks::owner_type.eq(OWNER_TYPE_USER))
            .select(tasks::id)
            .load(&mut conn)
            .await
            .map_err(|e| {
                map_diesel_error(
                    e,
                    TaskRepositoryError::query,
                    TaskRepositoryError::connection,
                )
            })
    }

    async fn active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AnchoredTask>, TaskRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, TaskRepositoryError::connection))?;

        let rows: Vec<TaskAnchorRow> = tasks::table
            .filter(tasks::user_id.eq(user_id.as_uuid()))
            .filter(tasks::owner_type.eq(OWNER_TYPE_USER))
            .filter(tasks::active.eq(true))
            .select(TaskAnchorRow::as_select())
            .order(tasks::created_at.asc())
            .load(&mut conn)
            .await
            .map_err(|e| {
                map_diesel_error(
                    e,
                    TaskRepositoryError::query,
                    TaskRepositoryError::connection,
                )
            })?;

        Ok(rows.into_iter().map(row_to_anchored).collect())
    }

    async fn scheduled_events(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ScheduledEvent>, TaskRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| map_pool_error(e, TaskRepositoryError::connection))?;

        let rows: Vec<EventRow> = events::table
            .filter(events::user_id.eq(user_id.as_uuid()))
            .select(EventRow::as_select())
            .order(events::due_start.asc())
            .limit(EVENT_LIMIT)
            .load(&mut conn)
            .await
            .map_err(|e| {
                map_diesel_error(
                    e,
                    TaskRepositoryError::query,
                    TaskRepositoryError::connection,
                )
            })?;

        Ok(rows.into_iter().filter_map(row_to_event).collect())
    }
}
