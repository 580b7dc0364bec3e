//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's repository ports, backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel models and domain types. No pacing logic lives here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leak to the domain layer.
//! - **Strongly typed errors**: database failures are mapped to the port
//!   error variants; raw diagnostics stay in debug logs.

mod diesel_audit_log;
mod diesel_commit_repository;
mod diesel_completion_repository;
mod diesel_message_repository;
mod diesel_preferences_repository;
mod diesel_shadow_config_repository;
mod diesel_shadow_task_repository;
mod diesel_task_repository;
mod diesel_user_directory;
mod error_mapping;
mod models;
mod pool;
mod schema;

pub use diesel_audit_log::DieselAuditLog;
pub use diesel_commit_repository::DieselCommitRepository;
pub use diesel_completion_repository::DieselCompletionRepository;
pub use diesel_message_repository::DieselMessageRepository;
pub use diesel_preferences_repository::DieselPreferencesRepository;
pub use diesel_shadow_config_repository::DieselShadowConfigRepository;
pub use diesel_shadow_task_repository::DieselShadowTaskRepository;
pub use diesel_task_repository::DieselTaskRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use pool::{DbPool, PoolConfig, PoolError};

pub(crate) use schema::push_subscriptions;
pub(crate) use models::PushSubscriptionRow;
