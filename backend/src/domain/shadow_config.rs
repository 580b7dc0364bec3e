//! Per-user shadow racing configuration.

use serde::{Deserialize, Serialize};

/// Default daily task target when no explicit pace has been set.
pub const DEFAULT_BASE_SPEED: f64 = 3.0;
/// Default cap on user-visible nudges per local day.
pub const DEFAULT_MAX_NOTIFICATIONS_PER_DAY: i64 = 10;
/// Default minimum spacing between nudges, in seconds.
pub const DEFAULT_MIN_SECONDS_BETWEEN_NOTIFICATIONS: i64 = 900;

/// Read-mostly pacing configuration for a single user.
///
/// Created by the setup flow; the pacing core only ever reads it. Missing
/// rows and null fields resolve to the defaults below, so config lookup can
/// never block the pipeline on an unconfigured user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Whether the shadow race (and therefore the whole pipeline) is active.
    pub enabled_race: bool,
    /// Baseline tasks-per-day pace.
    pub base_speed: f64,
    /// Dynamically adapted target pace; falls back to `base_speed` when unset.
    pub shadow_speed_target: Option<f64>,
    /// Daily cap enforced by the notification gate.
    pub max_notifications_per_day: i64,
    /// Minimum spacing enforced by the notification gate.
    pub min_seconds_between_notifications: i64,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled_race: true,
            base_speed: DEFAULT_BASE_SPEED,
            shadow_speed_target: None,
            max_notifications_per_day: DEFAULT_MAX_NOTIFICATIONS_PER_DAY,
            min_seconds_between_notifications: DEFAULT_MIN_SECONDS_BETWEEN_NOTIFICATIONS,
        }
    }
}

impl ShadowConfig {
    /// Today's target completion count.
    ///
    /// `max(0, round_half_up(shadow_speed_target ?? base_speed))`, always a
    /// non-negative integer.
    ///
    /// # Examples
    /// ```
    /// use nourish_backend::domain::ShadowConfig;
    ///
    /// let cfg = ShadowConfig { shadow_speed_target: Some(4.5), ..ShadowConfig::default() };
    /// assert_eq!(cfg.target_today(), 5);
    /// ```
    #[must_use]
    pub fn target_today(&self) -> i32 {
        let raw = self.shadow_speed_target.unwrap_or(self.base_speed);
        let rounded = raw.round();
        if rounded.is_sign_negative() || rounded.is_nan() {
            0
        } else if rounded >= f64::from(i32::MAX) {
            i32::MAX
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "value is rounded, non-negative and below i32::MAX"
            )]
            {
                rounded as i32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, 3.0, 3)]
    #[case(Some(4.5), 3.0, 5)]
    #[case(Some(4.4), 3.0, 4)]
    #[case(Some(-2.0), 3.0, 0)]
    #[case(Some(0.0), 3.0, 0)]
    fn target_rounds_and_clamps(
        #[case] target: Option<f64>,
        #[case] base: f64,
        #[case] expected: i32,
    ) {
        let cfg = ShadowConfig {
            shadow_speed_target: target,
            base_speed: base,
            ..ShadowConfig::default()
        };
        assert_eq!(cfg.target_today(), expected);
    }

    #[rstest]
    fn defaults_match_product_policy() {
        let cfg = ShadowConfig::default();
        assert!(cfg.enabled_race);
        assert_eq!(cfg.max_notifications_per_day, 10);
        assert_eq!(cfg.min_seconds_between_notifications, 900);
        assert_eq!(cfg.target_today(), 3);
    }
}
