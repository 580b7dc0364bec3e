//! Port for reading task completions for a bucketed day.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::UserId;

/// One completion row for the bucketed day.
///
/// A task may appear more than once (repeat completions); the aggregator
/// deduplicates by task id before counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    /// Task the completion belongs to.
    pub task_id: Uuid,
    /// Instant the completion row was created.
    pub completed_at: DateTime<Utc>,
}

/// Errors raised by completion adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionRepositoryError {
    /// Repository connection could not be established.
    #[error("completion repository connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Query failed during execution.
    #[error("completion repository query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl CompletionRepositoryError {
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

/// Read-only port for the day's completion rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// All completion rows for the user on the given local day key.
    async fn completions_for_day(
        &self,
        user_id: &UserId,
        day: &str,
    ) -> Result<Vec<TaskCompletion>, CompletionRepositoryError>;
}
