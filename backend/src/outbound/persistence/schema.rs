//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. Diesel uses
//! them for compile-time query validation and type-safe SQL generation.
//!
//! Uniqueness constraints the pipeline leans on:
//!
//! - `shadow_progress_commits`: unique on `(user_id, day)`
//! - `shadow_progress_daily`: primary key `(user_id, date)`
//! - `user_messages`: unique on `(user_id, day, attempt_seq)`
//! - `shadow_task_instances`: unique on `(shadow_task_id, planned_date_local)`
//! - `shadow_passes`: primary key `(user_id, task_id, date)`

diesel::table! {
    /// Account rows, owned by the main application.
    app_users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// System-administrator flag checked by the admin endpoints.
        is_sys_admin -> Bool,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user shadow racing configuration, one row per user.
    shadow_config (user_id) {
        /// Owning user.
        user_id -> Uuid,
        /// Whether the shadow race is active.
        enabled_race -> Bool,
        /// Baseline tasks-per-day pace; null resolves to the default.
        base_speed -> Nullable<Float8>,
        /// Adapted target pace; null falls back to `base_speed`.
        shadow_speed_target -> Nullable<Float8>,
        /// Daily nudge cap; null resolves to the default.
        max_notifications_per_day -> Nullable<Int8>,
        /// Minimum nudge spacing in seconds; null resolves to the default.
        min_seconds_between_notifications -> Nullable<Int8>,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// User preferences; the pipeline only reads the timezone.
    user_preferences (user_id) {
        /// Owning user.
        user_id -> Uuid,
        /// IANA timezone name, if the user has set one.
        timezone -> Nullable<Varchar>,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Routine tasks, both user-owned and shadow-owned.
    tasks (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Task title.
        title -> Varchar,
        /// Either `user` or `shadow`.
        owner_type -> Varchar,
        /// Whether the task is part of the active routine.
        active -> Bool,
        /// Anchor label (`morning`, `midday`, ...); null lays out as anytime.
        anchor -> Nullable<Varchar>,
        /// User-assigned ordering within the anchor group.
        order_hint -> Nullable<Int4>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Calendar events pinning routine items to explicit due times.
    events (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Routine task the event covers; null for free-floating events.
        routine_item_id -> Nullable<Uuid>,
        /// Start of the event window.
        due_start -> Nullable<Timestamptz>,
        /// End of the event window; the due time when set.
        due_end -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Task completion events, bucketed by local day key.
    task_completions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// User who completed the task.
        user_id -> Uuid,
        /// Completed task.
        task_id -> Uuid,
        /// Local day key (`YYYY-MM-DD`) the completion was bucketed into.
        day -> Varchar,
        /// Instant the completion row was created.
        completed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Idempotent per-day pacing commits; unique on `(user_id, day)`.
    shadow_progress_commits (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owner of the commit.
        user_id -> Uuid,
        /// Local day key (`YYYY-MM-DD`).
        day -> Varchar,
        /// `completed_today - target_today`, signed.
        delta -> Int4,
        /// Target completion count for the day.
        target_today -> Int4,
        /// Deduplicated completed count.
        completed_today -> Int4,
        /// Decision label (`boost`, `slowdown`, `nudge`, `noop`).
        decision_kind -> Varchar,
        /// Audit payload: timezone, completed task ids, trigger flags.
        payload -> Jsonb,
        /// Access level the writing adapter operated under.
        access_level -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Denormalised per-day chart rows; primary key `(user_id, date)`.
    shadow_progress_daily (user_id, date) {
        /// Owner of the row.
        user_id -> Uuid,
        /// Local day key (`YYYY-MM-DD`).
        date -> Varchar,
        /// The user's completion count.
        user_distance -> Int4,
        /// The shadow's progress.
        shadow_distance -> Int4,
        /// `user_distance - shadow_distance`.
        lead -> Int4,
        /// Target pace the shadow ran at.
        shadow_speed_target -> Int4,
        /// Cron-batch metric: signed minutes saved against the plan.
        time_saved_minutes -> Nullable<Int8>,
        /// Cron-batch metric: `max(0, 1 - cv)` over completion gaps.
        pace_consistency -> Nullable<Float8>,
        /// Cron-batch metric: completions minus elapsed slots.
        delta_now -> Nullable<Int4>,
        /// Cron-batch metric: completions in the trailing hour.
        user_speed_now -> Nullable<Int4>,
        /// Cron-batch metric: slots due within the next hour.
        shadow_speed_now -> Nullable<Int4>,
        /// Cron-batch metric: slots already elapsed.
        shadow_distance_now -> Nullable<Int4>,
        /// Access level the writing adapter operated under.
        access_level -> Varchar,
        /// When this row was last recomputed.
        last_computed_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stored nudge messages; unique on `(user_id, day, attempt_seq)`.
    user_messages (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Recipient.
        user_id -> Uuid,
        /// Local day key the nudge belongs to.
        day -> Varchar,
        /// 1-based sequence within the day.
        attempt_seq -> Int4,
        /// Notification title.
        title -> Varchar,
        /// Notification body.
        body -> Text,
        /// In-app deep link.
        url -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shadow racer profiles, one per opted-in user.
    shadow_profiles (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Ghost tasks mirroring the profile owner's routine.
    shadow_tasks (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning shadow profile.
        shadow_profile_id -> Uuid,
        /// Title copied from the source task.
        title -> Varchar,
        /// Whether the mirror is part of the active routine.
        active -> Bool,
        /// Anchor label copied from the source task.
        anchor -> Nullable<Varchar>,
        /// Ordering hint copied from the source task.
        order_hint -> Nullable<Int4>,
        /// Source task creation timestamp, carried for layout ordering.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Planned ghost instances; unique on
    /// `(shadow_task_id, planned_date_local)`.
    shadow_task_instances (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Ghost task the instance belongs to.
        shadow_task_id -> Uuid,
        /// Planned start instant.
        planned_start_at -> Timestamptz,
        /// Planned end instant.
        planned_end_at -> Timestamptz,
        /// Local day key the instance is planned for.
        planned_date_local -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Shadow pass marks; primary key `(user_id, task_id, date)`.
    shadow_passes (user_id, task_id, date) {
        /// Owning user.
        user_id -> Uuid,
        /// The task the shadow overtook.
        task_id -> Uuid,
        /// Local day key of the pass.
        date -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail written by the pacing pipeline.
    audit_entries (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// User the entry concerns.
        user_id -> Uuid,
        /// Local day key (`YYYY-MM-DD`).
        day -> Varchar,
        /// Entry kind (`race_update`, `pace_adapt`).
        kind -> Varchar,
        /// Structured entry payload.
        payload -> Jsonb,
        /// Access level the writing adapter operated under.
        access_level -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Web push subscriptions registered by the user's devices.
    push_subscriptions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Push relay endpoint URL.
        endpoint -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}
