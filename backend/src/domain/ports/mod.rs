//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the pacing pipeline expects to interact with driven
//! adapters (the relational store, push delivery, the audit log). Each trait
//! exposes a strongly typed error so adapters map their failures into
//! predictable variants instead of returning `anyhow::Result`.

mod audit_log;
mod commit_repository;
mod completion_repository;
mod message_repository;
mod preferences_repository;
mod push_delivery;
mod shadow_config_repository;
mod shadow_task_repository;
mod task_repository;
mod user_directory;

#[cfg(test)]
pub use audit_log::MockAuditLog;
pub use audit_log::{AuditKind, AuditLog, AuditLogError, FixtureAuditLog};
#[cfg(test)]
pub use commit_repository::MockCommitRepository;
pub use commit_repository::{CommitRepository, CommitRepositoryError};
#[cfg(test)]
pub use completion_repository::MockCompletionRepository;
pub use completion_repository::{CompletionRepository, CompletionRepositoryError, TaskCompletion};
#[cfg(test)]
pub use message_repository::MockMessageRepository;
pub use message_repository::{
    MessageRepository, MessageRepositoryError, MessageStamp, NewNudge, NudgeInsert,
};
#[cfg(test)]
pub use preferences_repository::MockPreferencesRepository;
pub use preferences_repository::{
    FixturePreferencesRepository, PreferencesRepository, PreferencesRepositoryError,
};
#[cfg(test)]
pub use push_delivery::MockPushDelivery;
pub use push_delivery::{NoOpPushDelivery, PushDelivery, PushDeliveryError, PushPayload};
#[cfg(test)]
pub use shadow_config_repository::MockShadowConfigRepository;
pub use shadow_config_repository::{
    FixtureShadowConfigRepository, ShadowConfigRepository, ShadowConfigRepositoryError,
};
#[cfg(test)]
pub use shadow_task_repository::MockShadowTaskRepository;
pub use shadow_task_repository::{
    ShadowPass, ShadowProfile, ShadowTaskRepository, ShadowTaskRepositoryError,
};
#[cfg(test)]
pub use task_repository::MockTaskRepository;
pub use task_repository::{ScheduledEvent, TaskRepository, TaskRepositoryError};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{FixtureUserDirectory, UserDirectory, UserDirectoryError};
