//! Pace decision engine.
//!
//! Pure functions only: comparing the day's completed count against the
//! shadow target yields a signed delta and one of four decision kinds. The
//! ±1 band is a deliberate noise buffer; it only earns the weaker `nudge`
//! tier, while `boost`/`slowdown` require a divergence of at least two
//! tasks.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome category of a pacing comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    /// At least two tasks ahead of target.
    Boost,
    /// At least two tasks behind target.
    Slowdown,
    /// Exactly one task off target in either direction.
    Nudge,
    /// On target; nothing to say.
    Noop,
}

impl DecisionKind {
    /// Stable lowercase name used on the wire and in audit payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boost => "boost",
            Self::Slowdown => "slowdown",
            Self::Nudge => "nudge",
            Self::Noop => "noop",
        }
    }

    /// Parse a stored label, treating anything unrecognised as [`Self::Noop`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "boost" => Self::Boost,
            "slowdown" => Self::Slowdown,
            "nudge" => Self::Nudge,
            _ => Self::Noop,
        }
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare completions against the target.
///
/// Returns `(delta, kind)` where `delta = completed - target`.
///
/// # Examples
/// ```
/// use nourish_backend::domain::{DecisionKind, decide};
///
/// assert_eq!(decide(7, 5), (2, DecisionKind::Boost));
/// assert_eq!(decide(5, 5), (0, DecisionKind::Noop));
/// ```
#[must_use]
pub const fn decide(completed: i32, target: i32) -> (i32, DecisionKind) {
    let delta = completed - target;
    let kind = if delta >= 2 {
        DecisionKind::Boost
    } else if delta <= -2 {
        DecisionKind::Slowdown
    } else if delta == 0 {
        DecisionKind::Noop
    } else {
        DecisionKind::Nudge
    };
    (delta, kind)
}

/// Title/body pair for a user-visible nudge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NudgeMessage {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
}

/// Compose the notification text for a decision.
///
/// The strings are a wire contract shared with the mobile client; change
/// them only together with the client.
#[must_use]
pub fn compose_nudge(
    kind: DecisionKind,
    delta: i32,
    target: i32,
    completed: i32,
) -> NudgeMessage {
    let abs = delta.abs();
    let (title, body) = match kind {
        DecisionKind::Boost => (
            "On a roll!".to_owned(),
            format!("You are ahead by {abs}. Consider tackling a stretch task."),
        ),
        DecisionKind::Slowdown => (
            "It's okay to slow down".to_owned(),
            format!("You are behind by {abs}. Try a small win to recover momentum."),
        ),
        DecisionKind::Nudge if delta < 0 => (
            "One more to go".to_owned(),
            "Finish one quick task to hit your target.".to_owned(),
        ),
        DecisionKind::Nudge => (
            "Nice pace".to_owned(),
            "Optional extra if you feel good.".to_owned(),
        ),
        DecisionKind::Noop => {
            let dir = if delta < 0 { "behind" } else { "ahead" };
            (
                "Keep pace today".to_owned(),
                format!("Target {target}, done {completed}. You are {dir} by {abs}."),
            )
        }
    };
    NudgeMessage { title, body }
}
