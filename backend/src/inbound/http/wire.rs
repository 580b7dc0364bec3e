//! Wire DTOs for the pacing endpoints.
//!
//! The JSON surface is a contract shared with the mobile client: flat
//! snake_case objects discriminated by an `ok` field. Domain outcomes are
//! translated here at the edge so the internal types can change shape
//! without breaking clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    BatchEntry, BatchReport, CycleOutcome, DecisionKind, GateReason, MaterialiseOutcome,
    ProgressCommit, TodayCommit, UserId,
};

/// Response body of a single-user pacing run.
///
/// A disabled race reports `{ok: false, reason: "race_disabled"}` and
/// nothing else; every other run reports `ok: true` with the day's numbers,
/// the nudge fields when one went out and the gate reason when one held it
/// back.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RunTodayResponse {
    /// Whether the pipeline ran for this user.
    pub ok: bool,
    /// Decision the delta earned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_kind: Option<DecisionKind>,
    /// `completed_today - target_today`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i32>,
    /// Target the shadow ran at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_today: Option<i32>,
    /// Deduplicated, user-owned completion count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_today: Option<i32>,
    /// Whether a nudge actually went out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nudged: Option<bool>,
    /// Why the run was refused or the nudge held back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<GateReason>,
    /// Stored message id of the sent nudge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uuid>,
    /// Sent nudge title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sent nudge body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl From<CycleOutcome> for RunTodayResponse {
    fn from(outcome: CycleOutcome) -> Self {
        if outcome.suppressed == Some(GateReason::RaceDisabled) {
            return Self {
                ok: false,
                decision_kind: None,
                delta: None,
                target_today: None,
                completed_today: None,
                nudged: None,
                reason: Some(GateReason::RaceDisabled),
                message_id: None,
                title: None,
                body: None,
            };
        }
        let (message_id, title, body) = match outcome.nudge {
            Some(nudge) => (Some(nudge.message_id), Some(nudge.title), Some(nudge.body)),
            None => (None, None, None),
        };
        Self {
            ok: true,
            decision_kind: Some(outcome.decision_kind),
            delta: Some(outcome.delta),
            target_today: Some(outcome.target_today),
            completed_today: Some(outcome.completed_today),
            nudged: Some(message_id.is_some()),
            reason: outcome.suppressed,
            message_id,
            title,
            body,
        }
    }
}

/// Flat rendering of a stored progress commit.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CommitBody {
    /// Owner of the commit.
    #[schema(value_type = String, format = "uuid")]
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
    #[schema(value_type = Object)]
    pub payload: Value,
    /// Set when read back from the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<ProgressCommit> for CommitBody {
    fn from(commit: ProgressCommit) -> Self {
        Self {
            user_id: commit.user_id,
            day: commit.day,
            delta: commit.delta,
            target_today: commit.target_today,
            completed_today: commit.completed_today,
            decision_kind: commit.decision_kind,
            payload: commit.payload,
            created_at: commit.created_at,
        }
    }
}

/// Response body of the explicit commit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CommitResponse {
    /// Always true; failures travel as error responses.
    pub ok: bool,
    /// The written commit, flattened into the top level.
    #[serde(flatten)]
    pub commit: CommitBody,
}

impl From<ProgressCommit> for CommitResponse {
    fn from(commit: ProgressCommit) -> Self {
        Self {
            ok: true,
            commit: commit.into(),
        }
    }
}

/// Request body of the explicit commit endpoint.
///
/// Only `payload` is read; unknown sibling fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CommitRequest {
    /// Extra fields merged into the commit's audit payload.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
}

/// Response body of the commit read-back endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TodayCommitResponse {
    /// Today's commit; `null` when no run has happened yet.
    pub commit: Option<CommitBody>,
    /// Timezone used for bucketing.
    pub tz: String,
    /// Local day key the lookup used.
    pub day: String,
}

impl From<TodayCommit> for TodayCommitResponse {
    fn from(today: TodayCommit) -> Self {
        Self {
            commit: today.commit.map(CommitBody::from),
            tz: today.timezone,
            day: today.day,
        }
    }
}

/// One racer's line of a cohort pacing sweep.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchRunEntry {
    /// User the entry concerns.
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    /// Whether the user's run completed.
    pub ok: bool,
    /// Decision the delta earned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_kind: Option<DecisionKind>,
    /// `completed_today - target_today`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i32>,
    /// Target the shadow ran at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_today: Option<i32>,
    /// Deduplicated, user-owned completion count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_today: Option<i32>,
    /// Whether a nudge actually went out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nudged: Option<bool>,
    /// Why the run was refused or the nudge held back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<GateReason>,
    /// Failure message for runs the batch isolated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<BatchEntry<CycleOutcome>> for BatchRunEntry {
    fn from(entry: BatchEntry<CycleOutcome>) -> Self {
        match entry.detail {
            Some(outcome) => {
                let run = RunTodayResponse::from(outcome);
                Self {
                    user_id: entry.user_id,
                    ok: run.ok,
                    decision_kind: run.decision_kind,
                    delta: run.delta,
                    target_today: run.target_today,
                    completed_today: run.completed_today,
                    nudged: run.nudged,
                    reason: run.reason,
                    error: None,
                }
            }
            None => Self {
                user_id: entry.user_id,
                ok: false,
                decision_kind: None,
                delta: None,
                target_today: None,
                completed_today: None,
                nudged: None,
                reason: None,
                error: entry.error,
            },
        }
    }
}

/// Response body of the cohort pacing sweeps.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchRunResponse {
    /// Always true; failures travel as error responses.
    pub ok: bool,
    /// Users attempted.
    pub total: usize,
    /// One entry per user, in cohort order.
    pub results: Vec<BatchRunEntry>,
}

impl From<BatchReport<CycleOutcome>> for BatchRunResponse {
    fn from(report: BatchReport<CycleOutcome>) -> Self {
        Self {
            ok: true,
            total: report.total,
            results: report.results.into_iter().map(BatchRunEntry::from).collect(),
        }
    }
}

/// One profile's line of a cohort materialisation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MaterialiseBatchEntry {
    /// User the entry concerns.
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    /// Instances that actually landed; re-runs report zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inserted: Option<usize>,
    /// Failure message for profiles the batch isolated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body of the cohort ghost materialisation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MaterialiseBatchResponse {
    /// Always true; failures travel as error responses.
    pub ok: bool,
    /// Shadow profiles attempted.
    pub total_profiles: usize,
    /// One entry per profile, in cohort order.
    pub results: Vec<MaterialiseBatchEntry>,
}

impl From<BatchReport<MaterialiseOutcome>> for MaterialiseBatchResponse {
    fn from(report: BatchReport<MaterialiseOutcome>) -> Self {
        Self {
            ok: true,
            total_profiles: report.total,
            results: report
                .results
                .into_iter()
                .map(|entry| MaterialiseBatchEntry {
                    user_id: entry.user_id,
                    inserted: entry.detail.map(|outcome| outcome.created_instances),
                    error: entry.error,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::domain::SentNudge;

    fn sent_outcome() -> CycleOutcome {
        CycleOutcome {
            day: "2025-06-01".to_owned(),
            timezone: "UTC".to_owned(),
            delta: -2,
            target_today: 3,
            completed_today: 1,
            decision_kind: DecisionKind::Slowdown,
            nudge: Some(SentNudge {
                message_id: Uuid::nil(),
                title: "It's okay to slow down".to_owned(),
                body: "You are behind by 2. Try a small win to recover momentum.".to_owned(),
            }),
            suppressed: None,
        }
    }

    #[rstest]
    fn disabled_races_expose_only_the_refusal() {
        let outcome = CycleOutcome::disabled("2025-06-01".to_owned(), "UTC".to_owned());
        let value = serde_json::to_value(RunTodayResponse::from(outcome)).expect("serialises");
        assert_eq!(value, json!({ "ok": false, "reason": "race_disabled" }));
    }

    #[rstest]
    fn sent_nudges_flatten_into_snake_case_fields() {
        let value = serde_json::to_value(RunTodayResponse::from(sent_outcome())).expect("serialises");
        assert_eq!(value["ok"], true);
        assert_eq!(value["decision_kind"], "slowdown");
        assert_eq!(value["delta"], -2);
        assert_eq!(value["target_today"], 3);
        assert_eq!(value["completed_today"], 1);
        assert_eq!(value["nudged"], true);
        assert_eq!(value["title"], "It's okay to slow down");
        assert!(value.get("reason").is_none());
        assert!(value.get("nudge").is_none(), "no nested nudge object");
    }

    #[rstest]
    fn gated_runs_carry_the_reason_without_message_fields() {
        let outcome = CycleOutcome {
            nudge: None,
            suppressed: Some(GateReason::RateLimitSpacing),
            ..sent_outcome()
        };
        let value = serde_json::to_value(RunTodayResponse::from(outcome)).expect("serialises");
        assert_eq!(value["ok"], true);
        assert_eq!(value["nudged"], false);
        assert_eq!(value["reason"], "rate_limit_spacing");
        assert!(value.get("message_id").is_none());
    }

    #[rstest]
    fn batch_entries_stay_flat_for_successes_and_failures() {
        let healthy = UserId::random();
        let broken = UserId::random();
        let report = BatchReport {
            total: 2,
            results: vec![
                BatchEntry::succeeded(healthy.clone(), sent_outcome()),
                BatchEntry::<CycleOutcome>::failed(broken.clone(), "connection reset"),
            ],
        };

        let value = serde_json::to_value(BatchRunResponse::from(report)).expect("serialises");
        assert_eq!(value["ok"], true);
        assert_eq!(value["total"], 2);
        assert_eq!(value["results"][0]["user_id"], healthy.to_string());
        assert_eq!(value["results"][0]["decision_kind"], "slowdown");
        assert!(value["results"][0].get("detail").is_none(), "no nested detail");
        assert_eq!(value["results"][1]["ok"], false);
        assert_eq!(value["results"][1]["error"], "connection reset");
    }

    #[rstest]
    fn commit_response_flattens_the_commit() {
        let commit = ProgressCommit {
            user_id: UserId::random(),
            day: "2025-06-01".to_owned(),
            delta: 0,
            target_today: 3,
            completed_today: 3,
            decision_kind: DecisionKind::Noop,
            payload: json!({ "timezone": "UTC" }),
            created_at: None,
        };
        let value = serde_json::to_value(CommitResponse::from(commit)).expect("serialises");
        assert_eq!(value["ok"], true);
        assert_eq!(value["day"], "2025-06-01");
        assert_eq!(value["decision_kind"], "noop");
        assert!(value.get("commit").is_none(), "flattened, not nested");
    }

    #[rstest]
    fn empty_lookups_render_an_explicit_null_commit() {
        let today = TodayCommit {
            day: "2025-06-01".to_owned(),
            timezone: "Asia/Kolkata".to_owned(),
            commit: None,
        };
        let value = serde_json::to_value(TodayCommitResponse::from(today)).expect("serialises");
        assert_eq!(value, json!({ "commit": null, "tz": "Asia/Kolkata", "day": "2025-06-01" }));
    }
}
