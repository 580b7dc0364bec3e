//! Port for shadow profiles, mirrored ghost tasks, planned instances and
//! pass marks.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{MirroredTask, PlannedInstance, UserId};

/// A user's shadow racer profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowProfile {
    /// Profile id.
    pub id: Uuid,
    /// Owning user.
    pub user_id: UserId,
}

/// One pass of the shadow over a user task, keyed on
/// `(user_id, task_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowPass {
    /// Owning user.
    pub user_id: UserId,
    /// The task the shadow overtook.
    pub task_id: Uuid,
    /// Local day key of the pass.
    pub date: String,
}

/// Errors raised by shadow-task adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShadowTaskRepositoryError {
    /// Repository connection could not be established.
    #[error("shadow task repository connection failed: {message}")]
    Connection {
        /// Adapter-provided diagnostic.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("shadow task repository query failed: {message}")]
    Query {
        /// Adapter-provided diagnostic.
        message: String,
    },
}

impl ShadowTaskRepositoryError {
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

/// Port over the shadow side of the schema.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShadowTaskRepository: Send + Sync {
    /// The user's shadow profile, if they have one.
    async fn profile_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ShadowProfile>, ShadowTaskRepositoryError>;

    /// Every shadow profile, for batch materialisation.
    async fn profiles(&self) -> Result<Vec<ShadowProfile>, ShadowTaskRepositoryError>;

    /// Active ghost tasks mirroring the profile owner's routine, joined to
    /// their anchor layout inputs.
    async fn active_mirrors(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<MirroredTask>, ShadowTaskRepositoryError>;

    /// Insert-or-ignore on `(shadow_task_id, planned_date_local)`; returns
    /// how many rows actually landed.
    async fn insert_instances(
        &self,
        instances: &[PlannedInstance],
    ) -> Result<usize, ShadowTaskRepositoryError>;

    /// Insert-or-ignore pass marks keyed on `(user_id, task_id, date)`.
    async fn upsert_passes(
        &self,
        passes: &[ShadowPass],
    ) -> Result<(), ShadowTaskRepositoryError>;
}
