//! Domain primitives and the shadow pacing pipeline.
//!
//! Purpose: hold the pure pacing logic (day bucketing, decision engine,
//! scheduler layout) and the services that orchestrate it through ports.
//! Types here are transport and storage agnostic; inbound and outbound
//! adapters translate to and from them at the edges.

pub mod day;
pub mod decision;
pub mod error;
pub mod pacing;
pub mod ports;
pub mod progress;
pub mod schedule;
pub mod shadow_config;
pub mod user;

pub use self::decision::{DecisionKind, NudgeMessage, compose_nudge, decide};
pub use self::error::{Error, ErrorCode};
pub use self::pacing::{
    BatchEntry, BatchReport, CycleOutcome, GateReason, PacingDeps, PacingService, RunTrigger,
    SentNudge, TodayCommit,
};
pub use self::progress::{DailyAggregate, ProgressCommit, ScheduleMetrics};
pub use self::schedule::{
    AnchoredTask, DryRunPlan, MaterialiseOutcome, MirroredTask, PlannedInstance, SchedulerService,
    TimeAnchor,
};
pub use self::shadow_config::ShadowConfig;
pub use self::user::UserId;

/// Access level a repository adapter operates under.
///
/// The managed deployment distinguished a user-scoped client (subject to
/// row-level security) from a service client that bypasses it. Modelling the
/// distinction as an explicit value makes the privilege boundary auditable:
/// adapters record it on every write and batch entry points must opt into
/// [`AccessLevel::Service`] deliberately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Operations scoped to the authenticated user's own rows.
    UserScoped,
    /// Privileged operations on behalf of arbitrary users (cron, admin).
    Service,
}

impl AccessLevel {
    /// Stable lowercase name used in audit payloads and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserScoped => "user_scoped",
            Self::Service => "service",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
