//! Port for task-table lookups (ownership, anchor layout inputs and
//! per-item schedule overrides).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{AnchoredTask, UserId};

/// A calendar event pinning one routine task to an explicit due time.
///
/// Events override the anchor-derived slot minute for their task when they
/// fall on the bucketed day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Routine task the event belongs to.
    pub task_id: Uuid,
    /// Due instant; the end of the event window when one is set, otherwise
    /// its start.
    pub due_at: DateTime<Utc>,
}

/// Errors raised by task adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskRepositoryError {
    /// Repository connection could not be established.
    #[error("task repository connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Query failed during execution.
    #[error("task repository query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl TaskRepositoryError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Read-only port for task rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Of the given ids, the subset whose `owner_type` is `user`.
    ///
    /// Shadow-owned ghost tasks must never count towards the user's own
    /// pace, so the aggregator intersects completions against this set.
    async fn filter_user_owned(
        &self,
        task_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, TaskRepositoryError>;

    /// The user's active, user-owned tasks with their anchor layout inputs,
    /// ordered by creation time ascending.
    async fn active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AnchoredTask>, TaskRepositoryError>;

    /// The user's upcoming calendar events, ordered by start time ascending.
    ///
    /// Adapters skip rows with no linked task or no usable due time.
    async fn scheduled_events(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ScheduledEvent>, TaskRepositoryError>;
}
