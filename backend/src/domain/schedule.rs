//! Routine scheduling: anchor layout, ghost-instance planning and the
//! schedule-alignment metrics.
//!
//! The shadow racer replays the user's routine against an idealised
//! timetable. Tasks are grouped by their time anchor, laid out at
//! fifteen-minute spacing within each group, and materialised as planned
//! instances for the local day. The same layout feeds the cron batch's
//! pace metrics.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use mockable::Clock;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::day::{local_date_key, local_minute_of_day, local_slot_instant, parse_day_key, resolve_timezone};
use super::error::Error;
use super::pacing::{BatchEntry, BatchReport};
use super::ports::{
    PreferencesRepository, ScheduledEvent, ShadowProfile, ShadowTaskRepository,
    ShadowTaskRepositoryError, TaskCompletion,
};
use super::progress::ScheduleMetrics;
use super::user::UserId;

/// Minutes between consecutive slots within one anchor group.
pub const SLOT_SPACING_MINUTES: i64 = 15;

/// Planned duration of a ghost instance.
pub const INSTANCE_DURATION_MINUTES: i64 = 10;

/// Wall-clock anchor a task is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeAnchor {
    /// 09:00 local.
    Morning,
    /// 13:00 local.
    Midday,
    /// 18:00 local.
    Evening,
    /// 21:00 local.
    Night,
    /// 15:00 local; also the fallback for unanchored tasks.
    Anytime,
}

impl TimeAnchor {
    /// First slot minute-of-day for this anchor.
    #[must_use]
    pub const fn base_minute(self) -> i64 {
        match self {
            Self::Morning => 9 * 60,
            Self::Midday => 13 * 60,
            Self::Anytime => 15 * 60,
            Self::Evening => 18 * 60,
            Self::Night => 21 * 60,
        }
    }

    /// Stable lowercase label stored in the anchor column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Midday => "midday",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::Anytime => "anytime",
        }
    }

    /// Parse a stored label, treating anything unrecognised as [`Self::Anytime`].
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("morning") => Self::Morning,
            Some("midday") => Self::Midday,
            Some("evening") => Self::Evening,
            Some("night") => Self::Night,
            _ => Self::Anytime,
        }
    }
}

impl std::fmt::Display for TimeAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout inputs for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredTask {
    /// Task identity carried through the layout.
    pub id: Uuid,
    /// Stored anchor; `None` lays out as [`TimeAnchor::Anytime`].
    pub anchor: Option<TimeAnchor>,
    /// User-assigned ordering within the anchor group.
    pub order_hint: Option<i32>,
    /// Creation instant, the final ordering tiebreak.
    pub created_at: DateTime<Utc>,
}

/// A ghost task mirroring one of the user's routine tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredTask {
    /// Ghost task id.
    pub shadow_task_id: Uuid,
    /// Title copied from the source task.
    pub title: String,
    /// Anchor copied from the source task.
    pub anchor: Option<TimeAnchor>,
    /// Ordering hint copied from the source task.
    pub order_hint: Option<i32>,
    /// Source task creation instant.
    pub created_at: DateTime<Utc>,
}

/// A planned ghost instance ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedInstance {
    /// Ghost task the instance belongs to.
    pub shadow_task_id: Uuid,
    /// Planned start instant.
    pub planned_start_at: DateTime<Utc>,
    /// Planned end instant (start plus the fixed duration).
    pub planned_end_at: DateTime<Utc>,
    /// Local day key the instance is planned for.
    pub planned_date_local: String,
}

/// One previewed slot in a dry run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSlot {
    /// Ghost task the slot belongs to.
    pub shadow_task_id: Uuid,
    /// Title shown in the preview.
    pub title: String,
    /// Planned start instant.
    pub planned_start_at: DateTime<Utc>,
    /// Planned end instant.
    pub planned_end_at: DateTime<Utc>,
}

/// Preview of today's ghost timetable, computed without writing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DryRunPlan {
    /// Local day the plan covers.
    pub planned_date_local: String,
    /// Timezone the plan was laid out in.
    pub timezone: String,
    /// Slots in timetable order.
    pub slots: Vec<PlannedSlot>,
}

/// Result of materialising today's ghost instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialiseOutcome {
    /// Local day the instances were planned for.
    pub planned_date_local: String,
    /// Rows that actually landed; re-runs report zero.
    pub created_instances: usize,
    /// Slots the plan produced.
    pub total_candidates: usize,
}

/// Assign each task its slot minute-of-day.
///
/// Tasks sort by anchor start time, then `order_hint` ascending with nulls
/// last, then creation time. Within an anchor group the nth task lands at
/// `base + n * 15` minutes.
#[must_use]
pub fn layout_minutes(tasks: &[AnchoredTask]) -> Vec<(Uuid, i64)> {
    let mut sorted: Vec<&AnchoredTask> = tasks.iter().collect();
    sorted.sort_by(|a, b| {
        let anchor_a = a.anchor.unwrap_or(TimeAnchor::Anytime);
        let anchor_b = b.anchor.unwrap_or(TimeAnchor::Anytime);
        anchor_a
            .base_minute()
            .cmp(&anchor_b.base_minute())
            .then_with(|| match (a.order_hint, b.order_hint) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut current: Option<TimeAnchor> = None;
    let mut index: i64 = 0;
    let mut out = Vec::with_capacity(sorted.len());
    for task in sorted {
        let anchor = task.anchor.unwrap_or(TimeAnchor::Anytime);
        if current != Some(anchor) {
            current = Some(anchor);
            index = 0;
        }
        out.push((task.id, anchor.base_minute() + index * SLOT_SPACING_MINUTES));
        index += 1;
    }
    out
}

/// Where the shadow stands against the user right now.
#[derive(Debug, Clone, PartialEq)]
pub struct PaceSnapshot {
    /// Extended metrics destined for the daily aggregate row.
    pub metrics: ScheduleMetrics,
    /// Tasks whose slot has elapsed; the shadow has moved past them whether
    /// or not the user completed them.
    pub passed_task_ids: Vec<Uuid>,
}

/// Compute the schedule-alignment metrics for one user.
///
/// `completions` must already be filtered to the user's own tasks for the
/// bucketed day. Each task's slot minute comes from the anchor layout,
/// overridden by a calendar event due on the same local day when one
/// exists. The shadow's position is the number of slots whose local minute
/// has elapsed; speeds are measured over one-hour windows on either side of
/// `now`.
#[must_use]
pub fn pace_snapshot(
    tasks: &[AnchoredTask],
    completions: &[TaskCompletion],
    events: &[ScheduledEvent],
    tz: &str,
    now: DateTime<Utc>,
) -> PaceSnapshot {
    let day = local_date_key(now, tz);
    let mut overrides: HashMap<Uuid, i64> = HashMap::new();
    // Events arrive ordered by start time; later rows win like the layout's
    // last-write semantics for the slot map.
    for event in events {
        if local_date_key(event.due_at, tz) == day {
            overrides.insert(event.task_id, local_minute_of_day(event.due_at, tz));
        }
    }
    let layout: Vec<(Uuid, i64)> = layout_minutes(tasks)
        .into_iter()
        .map(|(id, minute)| (id, overrides.get(&id).copied().unwrap_or(minute)))
        .collect();
    let now_minute = local_minute_of_day(now, tz);

    let completed_tasks: BTreeSet<Uuid> = completions.iter().map(|c| c.task_id).collect();

    let elapsed: Vec<&(Uuid, i64)> = layout.iter().filter(|(_, m)| *m <= now_minute).collect();
    let shadow_distance_now = clamp_count(elapsed.len());
    let delta_now = clamp_count(completed_tasks.len()) - shadow_distance_now;

    let hour_ago = now - Duration::hours(1);
    let user_speed_now = clamp_count(
        completions
            .iter()
            .filter(|c| c.completed_at > hour_ago && c.completed_at <= now)
            .count(),
    );
    let shadow_speed_now = clamp_count(
        layout
            .iter()
            .filter(|(_, m)| *m > now_minute && *m <= now_minute + 60)
            .count(),
    );

    PaceSnapshot {
        metrics: ScheduleMetrics {
            time_saved_minutes: time_saved_minutes(&layout, completions, tz),
            pace_consistency: pace_consistency(completions),
            delta_now,
            user_speed_now,
            shadow_speed_now,
            shadow_distance_now,
        },
        passed_task_ids: elapsed.iter().map(|(id, _)| *id).collect(),
    }
}

/// Signed minutes the user banked against the timetable.
///
/// Each completed task is matched against its own slot minute; finishing
/// earlier than the slot counts positive. Completions of tasks with no slot
/// contribute nothing.
fn time_saved_minutes(layout: &[(Uuid, i64)], completions: &[TaskCompletion], tz: &str) -> i64 {
    let minutes: HashMap<Uuid, i64> = layout.iter().copied().collect();
    // Last row per task wins, mirroring the completion store's row order.
    let mut latest: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
    for completion in completions {
        latest.insert(completion.task_id, completion.completed_at);
    }
    latest
        .iter()
        .filter_map(|(task_id, instant)| {
            minutes
                .get(task_id)
                .map(|slot| slot - local_minute_of_day(*instant, tz))
        })
        .sum()
}

/// `max(0, 1 - cv)` over the gaps between consecutive completion rows.
///
/// Every row counts, repeats included; a degenerate near-zero mean gap
/// scores zero, and fewer than two rows says nothing about consistency.
fn pace_consistency(completions: &[TaskCompletion]) -> Option<f64> {
    if completions.len() < 2 {
        return None;
    }
    let mut instants: Vec<DateTime<Utc>> = completions.iter().map(|c| c.completed_at).collect();
    instants.sort();

    let gaps: Vec<f64> = instants
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_seconds() as f64 / 60.0)
        .collect();

    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    if mean <= f64::EPSILON {
        return Some(0.0);
    }
    let variance = gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / gaps.len() as f64;
    let cv = variance.sqrt() / mean;
    Some((1.0 - cv).max(0.0))
}

fn clamp_count(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn map_shadow_task_error(err: ShadowTaskRepositoryError) -> Error {
    tracing::error!(error = %err, "shadow task repository failure");
    match err {
        ShadowTaskRepositoryError::Connection { .. } => {
            Error::service_unavailable("shadow task store unavailable")
        }
        ShadowTaskRepositoryError::Query { .. } => Error::internal("shadow task store query failed"),
    }
}

/// Orchestrates ghost timetable planning against the ports.
pub struct SchedulerService {
    shadow_tasks: Arc<dyn ShadowTaskRepository>,
    preferences: Arc<dyn PreferencesRepository>,
    clock: Arc<dyn Clock>,
    default_tz: String,
}

impl SchedulerService {
    /// Build the service over its driven ports.
    pub fn new(
        shadow_tasks: Arc<dyn ShadowTaskRepository>,
        preferences: Arc<dyn PreferencesRepository>,
        clock: Arc<dyn Clock>,
        default_tz: impl Into<String>,
    ) -> Self {
        Self {
            shadow_tasks,
            preferences,
            clock,
            default_tz: default_tz.into(),
        }
    }

    /// Preview today's ghost timetable without writing anything.
    pub async fn dry_run_today(&self, user: &UserId) -> Result<DryRunPlan, Error> {
        let profile = self.require_profile(user).await?;
        let (plan, _) = self.plan_for_profile(&profile).await?;
        Ok(plan)
    }

    /// Materialise today's ghost instances for one user.
    pub async fn materialise_today(&self, user: &UserId) -> Result<MaterialiseOutcome, Error> {
        let profile = self.require_profile(user).await?;
        self.materialise_profile(&profile).await
    }

    /// Materialise today's instances for every profile, isolating failures
    /// per profile so one bad row cannot sink the batch.
    pub async fn materialise_all(&self) -> Result<BatchReport<MaterialiseOutcome>, Error> {
        let profiles = self
            .shadow_tasks
            .profiles()
            .await
            .map_err(map_shadow_task_error)?;
        let mut results = Vec::with_capacity(profiles.len());
        for profile in &profiles {
            match self.materialise_profile(profile).await {
                Ok(outcome) => {
                    results.push(BatchEntry::succeeded(profile.user_id.clone(), outcome));
                }
                Err(err) => {
                    tracing::error!(user_id = %profile.user_id, error = %err, "ghost materialisation failed");
                    results.push(BatchEntry::failed(profile.user_id.clone(), err.message()));
                }
            }
        }
        Ok(BatchReport {
            total: profiles.len(),
            results,
        })
    }

    async fn require_profile(&self, user: &UserId) -> Result<ShadowProfile, Error> {
        self.shadow_tasks
            .profile_for_user(user)
            .await
            .map_err(map_shadow_task_error)?
            .ok_or_else(|| {
                Error::invalid_request("no shadow profile; enable the shadow race first")
            })
    }

    async fn materialise_profile(
        &self,
        profile: &ShadowProfile,
    ) -> Result<MaterialiseOutcome, Error> {
        let (plan, instances) = self.plan_for_profile(profile).await?;
        let created = self
            .shadow_tasks
            .insert_instances(&instances)
            .await
            .map_err(map_shadow_task_error)?;
        Ok(MaterialiseOutcome {
            planned_date_local: plan.planned_date_local,
            created_instances: created,
            total_candidates: instances.len(),
        })
    }

    async fn plan_for_profile(
        &self,
        profile: &ShadowProfile,
    ) -> Result<(DryRunPlan, Vec<PlannedInstance>), Error> {
        let tz = self.timezone_for(&profile.user_id).await;
        let now = self.clock.utc();
        let day = local_date_key(now, &tz);
        let date = parse_day_key(&day)
            .map_err(|_| Error::internal("day key failed to round-trip"))?;

        let mirrors = self
            .shadow_tasks
            .active_mirrors(profile.id)
            .await
            .map_err(map_shadow_task_error)?;
        Ok(plan_day(&mirrors, date, &day, &tz))
    }

    async fn timezone_for(&self, user: &UserId) -> String {
        match self.preferences.timezone_for_user(user).await {
            Ok(preference) => resolve_timezone(preference, &self.default_tz),
            Err(err) => {
                tracing::warn!(user_id = %user, error = %err, "preference lookup failed; using default timezone");
                self.default_tz.clone()
            }
        }
    }
}

/// Lay out the mirrors on the given local date.
fn plan_day(
    mirrors: &[MirroredTask],
    date: NaiveDate,
    day: &str,
    tz: &str,
) -> (DryRunPlan, Vec<PlannedInstance>) {
    let tasks: Vec<AnchoredTask> = mirrors
        .iter()
        .map(|m| AnchoredTask {
            id: m.shadow_task_id,
            anchor: m.anchor,
            order_hint: m.order_hint,
            created_at: m.created_at,
        })
        .collect();
    let titles: HashMap<Uuid, &str> = mirrors
        .iter()
        .map(|m| (m.shadow_task_id, m.title.as_str()))
        .collect();

    let mut slots = Vec::with_capacity(mirrors.len());
    let mut instances = Vec::with_capacity(mirrors.len());
    for (id, minute) in layout_minutes(&tasks) {
        let start = local_slot_instant(date, minute, tz);
        let end = start + Duration::minutes(INSTANCE_DURATION_MINUTES);
        slots.push(PlannedSlot {
            shadow_task_id: id,
            title: titles.get(&id).copied().unwrap_or_default().to_owned(),
            planned_start_at: start,
            planned_end_at: end,
        });
        instances.push(PlannedInstance {
            shadow_task_id: id,
            planned_start_at: start,
            planned_end_at: end,
            planned_date_local: day.to_owned(),
        });
    }

    (
        DryRunPlan {
            planned_date_local: day.to_owned(),
            timezone: tz.to_owned(),
            slots,
        },
        instances,
    )
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
