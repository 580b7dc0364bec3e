//! Port for the idempotent progress-commit and daily-aggregate store.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AccessLevel, DailyAggregate, ProgressCommit, UserId};

/// Errors raised by commit-store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitRepositoryError {
    /// Repository connection could not be established.
    #[error("commit repository connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("commit repository query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl CommitRepositoryError {
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

/// Port for writing the day's outcome.
///
/// Both writes are upserts on their day key; running them twice with the
/// same inputs leaves exactly one row with identical values. Callers pass
/// the [`AccessLevel`] each write operates under: session-driven runs write
/// as the user, batch entry points as the service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommitRepository: Send + Sync {
    /// Insert or overwrite the commit keyed on `(user_id, day)`.
    async fn upsert_commit(
        &self,
        commit: &ProgressCommit,
        access: AccessLevel,
    ) -> Result<(), CommitRepositoryError>;

    /// Read back the commit for a day, if one exists.
    async fn find_commit(
        &self,
        user_id: &UserId,
        day: &str,
    ) -> Result<Option<ProgressCommit>, CommitRepositoryError>;

    /// Insert or overwrite the chart row keyed on `(user_id, date)`.
    async fn upsert_daily(
        &self,
        row: &DailyAggregate,
        access: AccessLevel,
    ) -> Result<(), CommitRepositoryError>;
}
