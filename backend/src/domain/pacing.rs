//! The pacing pipeline: aggregate completions, decide, commit, gate and
//! notify.
//!
//! One code path serves every trigger. Interactive runs, cron runs and both
//! batch entry points all flow through [`PacingService::run_cycle`]; the
//! trigger only selects how much enrichment the daily aggregate receives and
//! what the audit payload records. The commit and aggregate upserts happen
//! before the notification gate, so rate limiting can never lose the day's
//! numbers.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use serde_json::{Value, json};
use utoipa::ToSchema;
use uuid::Uuid;

use super::AccessLevel;
use super::day::{local_date_key, resolve_timezone};
use super::decision::{DecisionKind, compose_nudge, decide};
use super::error::Error;
use super::ports::{
    AuditKind, AuditLog, CommitRepository, CommitRepositoryError, CompletionRepository,
    CompletionRepositoryError, MessageRepository, MessageRepositoryError, NewNudge, NudgeInsert,
    PreferencesRepository, PushDelivery, PushPayload, ShadowConfigRepository,
    ShadowConfigRepositoryError, ShadowPass, ShadowTaskRepository, TaskCompletion, TaskRepository,
    TaskRepositoryError,
};
use super::progress::{DailyAggregate, ProgressCommit};
use super::schedule::pace_snapshot;
use super::user::UserId;

/// Deep link attached to every nudge.
const SHADOW_URL: &str = "/shadow";

/// What caused a pacing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    /// The user pressed the button.
    Interactive,
    /// An administrator ran the whole cohort.
    AdminBatch,
    /// The scheduled cohort run, which also computes the extended metrics.
    CronBatch,
}

impl RunTrigger {
    /// Stable lowercase name recorded in audit payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::AdminBatch => "admin_batch",
            Self::CronBatch => "cron_batch",
        }
    }

    /// Whether the run is part of a cohort sweep.
    #[must_use]
    pub const fn is_batch(self) -> bool {
        matches!(self, Self::AdminBatch | Self::CronBatch)
    }

    /// Whether the run was machine initiated.
    #[must_use]
    pub const fn is_cron(self) -> bool {
        matches!(self, Self::CronBatch)
    }

    /// Access level the run's store writes operate under.
    ///
    /// Interactive runs write as the session user; both batch entry points
    /// act on arbitrary users and need the service level.
    #[must_use]
    pub const fn access_level(self) -> AccessLevel {
        match self {
            Self::Interactive => AccessLevel::UserScoped,
            Self::AdminBatch | Self::CronBatch => AccessLevel::Service,
        }
    }
}

/// Why a run produced no notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GateReason {
    /// The user has opted out of the race.
    RaceDisabled,
    /// The daily notification cap was already reached.
    RateLimitDaily,
    /// The previous notification was too recent.
    RateLimitSpacing,
    /// A concurrent run already sent this attempt.
    DuplicateSuppressed,
}

impl GateReason {
    /// Stable lowercase name carried on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RaceDisabled => "race_disabled",
            Self::RateLimitDaily => "rate_limit_daily",
            Self::RateLimitSpacing => "rate_limit_spacing",
            Self::DuplicateSuppressed => "duplicate_suppressed",
        }
    }
}

/// A nudge that actually went out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNudge {
    /// Stored message id.
    pub message_id: Uuid,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
}

/// Everything one pacing run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// Local day the run was bucketed to.
    pub day: String,
    /// Timezone used for bucketing.
    pub timezone: String,
    /// `completed_today - target_today`.
    pub delta: i32,
    /// Target the shadow ran at.
    pub target_today: i32,
    /// Deduplicated, user-owned completion count.
    pub completed_today: i32,
    /// Decision the delta earned.
    pub decision_kind: DecisionKind,
    /// Set when a nudge was stored and delivery attempted.
    pub nudge: Option<SentNudge>,
    /// Set when the gate (or the race toggle) held the nudge back.
    pub suppressed: Option<GateReason>,
}

impl CycleOutcome {
    /// Outcome of a run refused by the race toggle.
    #[must_use]
    pub fn disabled(day: String, timezone: String) -> Self {
        Self {
            day,
            timezone,
            delta: 0,
            target_today: 0,
            completed_today: 0,
            decision_kind: DecisionKind::Noop,
            nudge: None,
            suppressed: Some(GateReason::RaceDisabled),
        }
    }
}

/// Today's stored commit, if any, with its bucketing context.
#[derive(Debug, Clone, PartialEq)]
pub struct TodayCommit {
    /// Local day key the lookup used.
    pub day: String,
    /// Timezone used for bucketing.
    pub timezone: String,
    /// The commit, absent when no run has happened yet today.
    pub commit: Option<ProgressCommit>,
}

/// Per-user line of a batch report.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry<T> {
    /// User the entry concerns.
    pub user_id: UserId,
    /// Whether the user's run completed.
    pub ok: bool,
    /// Run outcome for successful entries.
    pub detail: Option<T>,
    /// Failure message for unsuccessful entries.
    pub error: Option<String>,
}

impl<T> BatchEntry<T> {
    /// Entry for a run that completed.
    #[must_use]
    pub fn succeeded(user_id: UserId, detail: T) -> Self {
        Self {
            user_id,
            ok: true,
            detail: Some(detail),
            error: None,
        }
    }

    /// Entry for a run that failed; the batch carries on regardless.
    #[must_use]
    pub fn failed(user_id: UserId, error: impl Into<String>) -> Self {
        Self {
            user_id,
            ok: false,
            detail: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of a cohort sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    /// Users attempted.
    pub total: usize,
    /// One entry per user, in cohort order.
    pub results: Vec<BatchEntry<T>>,
}

/// Driven ports the pacing service runs against.
pub struct PacingDeps {
    /// Per-user race configuration.
    pub config: Arc<dyn ShadowConfigRepository>,
    /// Timezone preference lookups.
    pub preferences: Arc<dyn PreferencesRepository>,
    /// Day-bucketed completion rows.
    pub completions: Arc<dyn CompletionRepository>,
    /// Task ownership and anchor layout.
    pub tasks: Arc<dyn TaskRepository>,
    /// Commit and daily-aggregate store.
    pub commits: Arc<dyn CommitRepository>,
    /// Nudge message store.
    pub messages: Arc<dyn MessageRepository>,
    /// Best-effort audit trail.
    pub audit: Arc<dyn AuditLog>,
    /// Best-effort push delivery.
    pub push: Arc<dyn PushDelivery>,
    /// Shadow profile store, used for pass marks.
    pub shadow_tasks: Arc<dyn ShadowTaskRepository>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Server-wide default timezone.
    pub default_tz: String,
}

/// Orchestrates the aggregate-decide-commit-gate-notify pipeline.
pub struct PacingService {
    deps: PacingDeps,
}

struct DayActivity {
    completed: i32,
    owned_ids: Vec<Uuid>,
    owned_completions: Vec<TaskCompletion>,
}

impl PacingService {
    /// Build the service over its driven ports.
    #[must_use]
    pub fn new(deps: PacingDeps) -> Self {
        Self { deps }
    }

    /// Read back today's commit without running the pipeline.
    pub async fn today_commit(&self, user: &UserId) -> Result<TodayCommit, Error> {
        let tz = self.timezone_for(user).await;
        let day = local_date_key(self.deps.clock.utc(), &tz);
        let commit = self
            .deps
            .commits
            .find_commit(user, &day)
            .await
            .map_err(map_commit_error)?;
        Ok(TodayCommit {
            day,
            timezone: tz,
            commit,
        })
    }

    /// Commit today's progress explicitly, merging any caller-supplied
    /// payload fields.
    ///
    /// Explicit commits skip the race toggle and never notify; the user
    /// asked for the write directly.
    pub async fn commit_today(&self, user: &UserId, extra: Value) -> Result<ProgressCommit, Error> {
        let config = self
            .deps
            .config
            .config_for_user(user)
            .await
            .map_err(map_config_error)?;
        let tz = self.timezone_for(user).await;
        let now = self.deps.clock.utc();
        let day = local_date_key(now, &tz);

        let activity = self.day_activity(user, &day).await?;
        let target = config.target_today();
        let (delta, kind) = decide(activity.completed, target);

        let mut payload = json!({
            "timezone": tz,
            "completedTaskIds": activity.owned_ids,
            "source": "manual_commit",
        });
        merge_extra(&mut payload, &extra);

        let commit = ProgressCommit {
            user_id: user.clone(),
            day: day.clone(),
            delta,
            target_today: target,
            completed_today: activity.completed,
            decision_kind: kind,
            payload,
            created_at: None,
        };
        self.deps
            .commits
            .upsert_commit(&commit, AccessLevel::UserScoped)
            .await
            .map_err(map_commit_error)?;
        self.deps
            .commits
            .upsert_daily(
                &DailyAggregate::from_commit(&commit, now),
                AccessLevel::UserScoped,
            )
            .await
            .map_err(map_commit_error)?;

        self.record_audit(
            user,
            &day,
            AuditKind::PaceAdapt,
            json!({
                "decision": kind.as_str(),
                "delta": delta,
                "targetToday": target,
                "completedToday": activity.completed,
                "source": "manual_commit",
            }),
        )
        .await;

        Ok(commit)
    }

    /// Run the full pipeline once for one user.
    pub async fn run_cycle(
        &self,
        user: &UserId,
        trigger: RunTrigger,
    ) -> Result<CycleOutcome, Error> {
        let config = self
            .deps
            .config
            .config_for_user(user)
            .await
            .map_err(map_config_error)?;
        let tz = self.timezone_for(user).await;
        let now = self.deps.clock.utc();
        let day = local_date_key(now, &tz);

        if !config.enabled_race {
            return Ok(CycleOutcome::disabled(day, tz));
        }

        let activity = self.day_activity(user, &day).await?;
        let target = config.target_today();
        let (delta, kind) = decide(activity.completed, target);

        self.record_audit(
            user,
            &day,
            AuditKind::RaceUpdate,
            json!({
                "timezone": tz,
                "targetToday": target,
                "completedToday": activity.completed,
                "delta": delta,
                "trigger": trigger.as_str(),
                "batch": trigger.is_batch(),
                "cron": trigger.is_cron(),
            }),
        )
        .await;

        let commit = ProgressCommit {
            user_id: user.clone(),
            day: day.clone(),
            delta,
            target_today: target,
            completed_today: activity.completed,
            decision_kind: kind,
            payload: json!({
                "timezone": tz,
                "completedTaskIds": activity.owned_ids,
                "trigger": trigger.as_str(),
            }),
            created_at: None,
        };
        self.deps
            .commits
            .upsert_commit(&commit, trigger.access_level())
            .await
            .map_err(map_commit_error)?;

        let mut daily = DailyAggregate::from_commit(&commit, now);
        if trigger == RunTrigger::CronBatch {
            self.enrich_daily(user, &day, &tz, now, &activity, &mut daily)
                .await?;
        }
        self.deps
            .commits
            .upsert_daily(&daily, trigger.access_level())
            .await
            .map_err(map_commit_error)?;

        self.record_audit(
            user,
            &day,
            AuditKind::PaceAdapt,
            json!({
                "decision": kind.as_str(),
                "delta": delta,
                "targetToday": target,
                "completedToday": activity.completed,
                "trigger": trigger.as_str(),
            }),
        )
        .await;

        let mut outcome = CycleOutcome {
            day: day.clone(),
            timezone: tz,
            delta,
            target_today: target,
            completed_today: activity.completed,
            decision_kind: kind,
            nudge: None,
            suppressed: None,
        };
        if kind == DecisionKind::Noop {
            return Ok(outcome);
        }

        self.gate_and_notify(user, &config, &day, now, &mut outcome)
            .await?;
        Ok(outcome)
    }

    /// Run the pipeline for every racer, isolating failures per user.
    pub async fn run_batch(&self, trigger: RunTrigger) -> Result<BatchReport<CycleOutcome>, Error> {
        let racers = self.deps.config.racers().await.map_err(map_config_error)?;
        let mut results = Vec::with_capacity(racers.len());
        for user in &racers {
            match self.run_cycle(user, trigger).await {
                Ok(outcome) => {
                    results.push(BatchEntry::succeeded(user.clone(), outcome));
                }
                Err(err) => {
                    tracing::error!(user_id = %user, error = %err, "pacing run failed");
                    results.push(BatchEntry::failed(user.clone(), err.message()));
                }
            }
        }
        Ok(BatchReport {
            total: racers.len(),
            results,
        })
    }

    async fn gate_and_notify(
        &self,
        user: &UserId,
        config: &super::shadow_config::ShadowConfig,
        day: &str,
        now: DateTime<Utc>,
        outcome: &mut CycleOutcome,
    ) -> Result<(), Error> {
        // Count within the same local-day bucket the unique
        // (user_id, day, attempt_seq) key uses, or the derived sequence
        // number collides with rows the count never saw.
        let stamps = self
            .deps
            .messages
            .messages_for_day(user, day)
            .await
            .map_err(map_message_error)?;

        let sent = i64::try_from(stamps.len()).unwrap_or(i64::MAX);
        if sent >= config.max_notifications_per_day {
            outcome.suppressed = Some(GateReason::RateLimitDaily);
            return Ok(());
        }
        if let Some(latest) = stamps.iter().map(|s| s.created_at).max() {
            let elapsed = (now - latest).num_seconds();
            if elapsed < config.min_seconds_between_notifications {
                outcome.suppressed = Some(GateReason::RateLimitSpacing);
                return Ok(());
            }
        }

        let message = compose_nudge(
            outcome.decision_kind,
            outcome.delta,
            outcome.target_today,
            outcome.completed_today,
        );
        let nudge = NewNudge {
            user_id: user.clone(),
            day: day.to_owned(),
            attempt_seq: i32::try_from(stamps.len() + 1).unwrap_or(i32::MAX),
            title: message.title.clone(),
            body: message.body.clone(),
            url: SHADOW_URL.to_owned(),
        };
        match self
            .deps
            .messages
            .insert_nudge(&nudge)
            .await
            .map_err(map_message_error)?
        {
            NudgeInsert::Inserted(message_id) => {
                let payload = PushPayload {
                    message_id,
                    title: message.title.clone(),
                    body: message.body.clone(),
                    url: SHADOW_URL.to_owned(),
                };
                if let Err(err) = self.deps.push.notify(user, &payload).await {
                    tracing::warn!(user_id = %user, error = %err, "push delivery failed");
                }
                outcome.nudge = Some(SentNudge {
                    message_id,
                    title: message.title,
                    body: message.body,
                });
            }
            NudgeInsert::AlreadySent => {
                outcome.suppressed = Some(GateReason::DuplicateSuppressed);
            }
        }
        Ok(())
    }

    async fn enrich_daily(
        &self,
        user: &UserId,
        day: &str,
        tz: &str,
        now: DateTime<Utc>,
        activity: &DayActivity,
        daily: &mut DailyAggregate,
    ) -> Result<(), Error> {
        let tasks = self
            .deps
            .tasks
            .active_for_user(user)
            .await
            .map_err(map_task_error)?;
        let events = self
            .deps
            .tasks
            .scheduled_events(user)
            .await
            .map_err(map_task_error)?;
        let snapshot = pace_snapshot(&tasks, &activity.owned_completions, &events, tz, now);

        daily.shadow_distance = snapshot.metrics.shadow_distance_now;
        daily.lead = activity.completed - snapshot.metrics.shadow_distance_now;
        daily.metrics = Some(snapshot.metrics);

        if !snapshot.passed_task_ids.is_empty() {
            let passes: Vec<ShadowPass> = snapshot
                .passed_task_ids
                .iter()
                .map(|task_id| ShadowPass {
                    user_id: user.clone(),
                    task_id: *task_id,
                    date: day.to_owned(),
                })
                .collect();
            if let Err(err) = self.deps.shadow_tasks.upsert_passes(&passes).await {
                tracing::warn!(user_id = %user, error = %err, "shadow pass upsert failed");
            }
        }
        Ok(())
    }

    async fn day_activity(&self, user: &UserId, day: &str) -> Result<DayActivity, Error> {
        let rows = self
            .deps
            .completions
            .completions_for_day(user, day)
            .await
            .map_err(map_completion_error)?;
        let distinct: BTreeSet<Uuid> = rows.iter().map(|c| c.task_id).collect();
        let ids: Vec<Uuid> = distinct.into_iter().collect();
        let owned_ids = self
            .deps
            .tasks
            .filter_user_owned(&ids)
            .await
            .map_err(map_task_error)?;
        let owned_set: BTreeSet<Uuid> = owned_ids.iter().copied().collect();
        let owned_completions: Vec<TaskCompletion> = rows
            .into_iter()
            .filter(|c| owned_set.contains(&c.task_id))
            .collect();
        Ok(DayActivity {
            completed: i32::try_from(owned_ids.len()).unwrap_or(i32::MAX),
            owned_ids,
            owned_completions,
        })
    }

    async fn timezone_for(&self, user: &UserId) -> String {
        match self.deps.preferences.timezone_for_user(user).await {
            Ok(preference) => resolve_timezone(preference, &self.deps.default_tz),
            Err(err) => {
                tracing::warn!(user_id = %user, error = %err, "preference lookup failed; using default timezone");
                self.deps.default_tz.clone()
            }
        }
    }

    async fn record_audit(&self, user: &UserId, day: &str, kind: AuditKind, payload: Value) {
        if let Err(err) = self.deps.audit.record(user, day, kind, payload).await {
            tracing::warn!(user_id = %user, kind = kind.as_str(), error = %err, "audit write failed");
        }
    }
}

/// Overlay the caller's extra fields onto the standard payload.
fn merge_extra(payload: &mut Value, extra: &Value) {
    if let (Some(base), Some(overlay)) = (payload.as_object_mut(), extra.as_object()) {
        for (key, value) in overlay {
            base.insert(key.clone(), value.clone());
        }
    }
}

fn map_config_error(err: ShadowConfigRepositoryError) -> Error {
    tracing::error!(error = %err, "shadow config repository failure");
    match err {
        ShadowConfigRepositoryError::Connection { .. } => {
            Error::service_unavailable("shadow config store unavailable")
        }
        ShadowConfigRepositoryError::Query { .. } => {
            Error::internal("shadow config store query failed")
        }
    }
}

fn map_completion_error(err: CompletionRepositoryError) -> Error {
    tracing::error!(error = %err, "completion repository failure");
    match err {
        CompletionRepositoryError::Connection { .. } => {
            Error::service_unavailable("completion store unavailable")
        }
        CompletionRepositoryError::Query { .. } => {
            Error::internal("completion store query failed")
        }
    }
}

fn map_task_error(err: TaskRepositoryError) -> Error {
    tracing::error!(error = %err, "task repository failure");
    match err {
        TaskRepositoryError::Connection { .. } => {
            Error::service_unavailable("task store unavailable")
        }
        TaskRepositoryError::Query { .. } => Error::internal("task store query failed"),
    }
}

fn map_commit_error(err: CommitRepositoryError) -> Error {
    tracing::error!(error = %err, "commit repository failure");
    match err {
        CommitRepositoryError::Connection { .. } => {
            Error::service_unavailable("commit store unavailable")
        }
        CommitRepositoryError::Query { .. } => Error::internal("commit store query failed"),
    }
}

fn map_message_error(err: MessageRepositoryError) -> Error {
    tracing::error!(error = %err, "message repository failure");
    match err {
        MessageRepositoryError::Connection { .. } => {
            Error::service_unavailable("message store unavailable")
        }
        MessageRepositoryError::Query { .. } => Error::internal("message store query failed"),
    }
}

#[cfg(test)]
#[path = "pacing_tests.rs"]
mod tests;
