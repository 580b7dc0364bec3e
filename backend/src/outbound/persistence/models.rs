//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    audit_entries, events, push_subscriptions, shadow_config, shadow_passes, shadow_profiles,
    shadow_progress_commits, shadow_progress_daily, shadow_task_instances, shadow_tasks,
    task_completions, tasks, user_messages,
};

/// Row struct for reading from the shadow_config table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shadow_config)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShadowConfigRow {
    pub enabled_race: bool,
    pub base_speed: Option<f64>,
    pub shadow_speed_target: Option<f64>,
    pub max_notifications_per_day: Option<i64>,
    pub min_seconds_between_notifications: Option<i64>,
}

/// Row struct for reading a completion's pacing-relevant columns.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_completions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskCompletionRow {
    pub task_id: Uuid,
    pub completed_at: DateTime<Utc>,
}

/// Row struct for reading a task's anchor layout inputs.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskAnchorRow {
    pub id: Uuid,
    pub anchor: Option<String>,
    pub order_hint: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading a calendar event's schedule-override columns.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EventRow {
    pub routine_item_id: Option<Uuid>,
    pub due_start: Option<DateTime<Utc>>,
    pub due_end: Option<DateTime<Utc>>,
}

/// Row struct for reading back a progress commit.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shadow_progress_commits)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommitRow {
    pub user_id: Uuid,
    pub day: String,
    pub delta: i32,
    pub target_today: i32,
    pub completed_today: i32,
    pub decision_kind: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for upserting a progress commit.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shadow_progress_commits)]
pub(crate) struct NewCommitRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day: &'a str,
    pub delta: i32,
    pub target_today: i32,
    pub completed_today: i32,
    pub decision_kind: &'a str,
    pub payload: &'a serde_json::Value,
    pub access_level: &'a str,
}

/// Insertable struct for upserting a daily aggregate row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shadow_progress_daily)]
pub(crate) struct NewDailyRow<'a> {
    pub user_id: Uuid,
    pub date: &'a str,
    pub user_distance: i32,
    pub shadow_distance: i32,
    pub lead: i32,
    pub shadow_speed_target: i32,
    pub time_saved_minutes: Option<i64>,
    pub pace_consistency: Option<f64>,
    pub delta_now: Option<i32>,
    pub user_speed_now: Option<i32>,
    pub shadow_speed_now: Option<i32>,
    pub shadow_distance_now: Option<i32>,
    pub access_level: &'a str,
    pub last_computed_at: DateTime<Utc>,
}

/// Row struct for reading a message's rate-limit stamp.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageStampRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for the insert-or-ignore nudge write.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_messages)]
pub(crate) struct NewMessageRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day: &'a str,
    pub attempt_seq: i32,
    pub title: &'a str,
    pub body: &'a str,
    pub url: &'a str,
}

/// Row struct for reading a shadow profile.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shadow_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShadowProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
}

/// Row struct for reading a ghost task's layout inputs.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shadow_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShadowTaskRow {
    pub id: Uuid,
    pub title: String,
    pub anchor: Option<String>,
    pub order_hint: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for planned ghost instances.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shadow_task_instances)]
pub(crate) struct NewInstanceRow<'a> {
    pub id: Uuid,
    pub shadow_task_id: Uuid,
    pub planned_start_at: DateTime<Utc>,
    pub planned_end_at: DateTime<Utc>,
    pub planned_date_local: &'a str,
}

/// Insertable struct for shadow pass marks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shadow_passes)]
pub(crate) struct NewPassRow<'a> {
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub date: &'a str,
}

/// Insertable struct for audit entries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_entries)]
pub(crate) struct NewAuditRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub day: &'a str,
    pub kind: &'a str,
    pub payload: &'a serde_json::Value,
    pub access_level: &'a str,
}

/// Row struct for reading a push subscription.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = push_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PushSubscriptionRow {
    pub id: Uuid,
    pub endpoint: String,
}
