//! Progress commit and daily aggregate records.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::decision::DecisionKind;
use super::user::UserId;

/// The day's reconciled pacing outcome for one user.
///
/// Invariant: at most one commit per `(user_id, day)`. The commit store
/// enforces this with upsert-on-conflict semantics, so re-running the
/// pipeline for the same day overwrites rather than duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressCommit {
    /// Owner of the commit.
    pub user_id: UserId,
    /// Local calendar day key (`YYYY-MM-DD`).
    pub day: String,
    /// `completed_today - target_today`, signed.
    pub delta: i32,
    /// Target completion count for the day.
    pub target_today: i32,
    /// Deduplicated count of the user's own completed tasks.
    pub completed_today: i32,
    /// Decision derived from the delta.
    pub decision_kind: DecisionKind,
    /// Audit payload: timezone, completed task ids, trigger flags.
    pub payload: Value,
    /// Set when read back from the store; `None` on writes.
    pub created_at: Option<DateTime<Utc>>,
}

/// Schedule-alignment metrics computed by the cron batch run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScheduleMetrics {
    /// Signed minutes saved against the planned schedule (positive = early).
    pub time_saved_minutes: i64,
    /// `max(0, 1 - cv)` over inter-completion gaps; `None` below two samples.
    pub pace_consistency: Option<f64>,
    /// Completions so far minus shadow slots already elapsed.
    pub delta_now: i32,
    /// Completions within the trailing hour.
    pub user_speed_now: i32,
    /// Shadow slots falling due within the next hour.
    pub shadow_speed_now: i32,
    /// Shadow slots already elapsed.
    pub shadow_distance_now: i32,
}

/// Denormalised per-day aggregate row backing the progress charts.
///
/// Same `(user_id, date)` uniqueness and upsert discipline as the commit.
/// The extended metric fields are populated only by the cron batch run and
/// stay `None` elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    /// Owner of the row.
    pub user_id: UserId,
    /// Local calendar day key (`YYYY-MM-DD`).
    pub date: String,
    /// The user's completion count.
    pub user_distance: i32,
    /// The shadow's progress (target, or elapsed slots in the cron variant).
    pub shadow_distance: i32,
    /// `user_distance - shadow_distance`.
    pub lead: i32,
    /// Target pace the shadow ran at.
    pub shadow_speed_target: i32,
    /// Extended cron-batch metrics; `None` outside the cron batch.
    pub metrics: Option<ScheduleMetrics>,
    /// When this row was last recomputed.
    pub last_computed_at: DateTime<Utc>,
}

impl DailyAggregate {
    /// Build the chart row for a plain (non-cron-batch) run.
    #[must_use]
    pub fn from_commit(commit: &ProgressCommit, now: DateTime<Utc>) -> Self {
        Self {
            user_id: commit.user_id.clone(),
            date: commit.day.clone(),
            user_distance: commit.completed_today,
            shadow_distance: commit.target_today,
            lead: commit.delta,
            shadow_speed_target: commit.target_today,
            metrics: None,
            last_computed_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn aggregate_mirrors_commit_counts() {
        let commit = ProgressCommit {
            user_id: UserId::random(),
            day: "2025-06-01".to_owned(),
            delta: -1,
            target_today: 4,
            completed_today: 3,
            decision_kind: DecisionKind::Nudge,
            payload: json!({}),
            created_at: None,
        };
        let row = DailyAggregate::from_commit(&commit, Utc::now());
        assert_eq!(row.user_distance, 3);
        assert_eq!(row.shadow_distance, 4);
        assert_eq!(row.lead, -1);
        assert_eq!(row.shadow_speed_target, 4);
        assert!(row.metrics.is_none());
    }
}
