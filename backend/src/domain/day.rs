//! Local-calendar-day bucketing.
//!
//! Every per-day aggregate in the pipeline (completions, commits, rate-limit
//! windows, scheduler instances) is partitioned by the user's local calendar
//! date, rendered as a `YYYY-MM-DD` key. Conversion goes through the IANA
//! timezone database rather than UTC offset arithmetic so the key stays
//! correct across DST transitions. All call sites share this module; there
//! must be no inline reimplementations.

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

/// Timezone used when a user has no preference and the server default is
/// unusable.
pub const FALLBACK_TIMEZONE: &str = "Asia/Kolkata";

/// Render the local calendar date of `instant` in `tz` as `YYYY-MM-DD`.
///
/// Unrecognised timezone names fall back silently to the UTC calendar date;
/// bucketing must never fail the pipeline.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use nourish_backend::domain::day::local_date_key;
///
/// let instant = Utc.with_ymd_and_hms(2025, 3, 9, 9, 30, 0).single().expect("valid");
/// assert_eq!(local_date_key(instant, "America/Los_Angeles"), "2025-03-09");
/// assert_eq!(local_date_key(instant, "not/a-zone"), "2025-03-09");
/// ```
#[must_use]
pub fn local_date_key(instant: DateTime<Utc>, tz: &str) -> String {
    let date = tz.parse::<Tz>().map_or_else(
        |_| instant.date_naive(),
        |zone| instant.with_timezone(&zone).date_naive(),
    );
    date.format("%Y-%m-%d").to_string()
}

/// Pick the effective timezone for a user: their stored preference when
/// present and non-empty, otherwise the server default.
#[must_use]
pub fn resolve_timezone(preference: Option<String>, default_tz: &str) -> String {
    match preference {
        Some(tz) if !tz.trim().is_empty() => tz,
        _ => default_tz.to_owned(),
    }
}

/// Minute-of-day of `instant` on the local clock in `tz` (0..=1439).
///
/// Used by the schedule-alignment metrics, which compare completion times
/// against planned slot minutes on the same local clock.
#[must_use]
pub fn local_minute_of_day(instant: DateTime<Utc>, tz: &str) -> i64 {
    let (hour, minute) = tz.parse::<Tz>().map_or_else(
        |_| (instant.hour(), instant.minute()),
        |zone| {
            let local = instant.with_timezone(&zone);
            (local.hour(), local.minute())
        },
    );
    i64::from(hour) * 60 + i64::from(minute)
}

/// Resolve a local wall-clock time on the given local date to an absolute
/// instant.
///
/// `minute_of_day` may exceed 1439 when slot spacing pushes an instance past
/// midnight; the overflow carries into the next day. During a DST gap the
/// earliest valid instant is used; if the zone cannot resolve the time at
/// all, the UTC reading of the same wall-clock time is returned.
#[must_use]
pub fn local_slot_instant(date: NaiveDate, minute_of_day: i64, tz: &str) -> DateTime<Utc> {
    let days = minute_of_day.div_euclid(24 * 60);
    let minute = minute_of_day.rem_euclid(24 * 60);
    let slot_date = date + chrono::Duration::days(days);
    let naive = slot_date.and_time(chrono::NaiveTime::MIN) + chrono::Duration::minutes(minute);

    match tz.parse::<Tz>() {
        Ok(zone) => zone
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| Utc.from_utc_datetime(&naive), |dt| dt.with_timezone(&Utc)),
        Err(_) => Utc.from_utc_datetime(&naive),
    }
}

/// Parse a `YYYY-MM-DD` day key back into a calendar date.
pub fn parse_day_key(day: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    // 2025-03-09 is the US spring-forward day; 09:30 UTC is 01:30 PST,
    // 30 minutes before the clocks jump.
    #[rstest]
    fn dst_transition_buckets_to_local_date() {
        let instant = Utc
            .with_ymd_and_hms(2025, 3, 9, 9, 30, 0)
            .single()
            .expect("valid instant");
        assert_eq!(local_date_key(instant, "America/Los_Angeles"), "2025-03-09");
    }

    #[rstest]
    fn late_utc_evening_is_next_day_in_kolkata() {
        let instant = Utc
            .with_ymd_and_hms(2025, 6, 1, 20, 0, 0)
            .single()
            .expect("valid instant");
        assert_eq!(local_date_key(instant, "Asia/Kolkata"), "2025-06-02");
    }

    #[rstest]
    fn unknown_zone_falls_back_to_utc_date() {
        let instant = Utc
            .with_ymd_and_hms(2025, 6, 1, 20, 0, 0)
            .single()
            .expect("valid instant");
        assert_eq!(local_date_key(instant, "Mars/Olympus"), "2025-06-01");
    }

    #[rstest]
    #[case(None, "Europe/Berlin", "Europe/Berlin")]
    #[case(Some("  ".to_owned()), "Europe/Berlin", "Europe/Berlin")]
    #[case(Some("Asia/Tokyo".to_owned()), "Europe/Berlin", "Asia/Tokyo")]
    fn timezone_preference_resolution(
        #[case] pref: Option<String>,
        #[case] default_tz: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(resolve_timezone(pref, default_tz), expected);
    }

    #[rstest]
    fn slot_instant_converts_local_wall_clock() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        // 09:00 in Kolkata is 03:30 UTC.
        let instant = local_slot_instant(date, 9 * 60, "Asia/Kolkata");
        assert_eq!(
            instant,
            Utc.with_ymd_and_hms(2025, 6, 1, 3, 30, 0)
                .single()
                .expect("valid instant")
        );
    }

    #[rstest]
    fn slot_minutes_past_midnight_carry_to_next_day() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");
        let instant = local_slot_instant(date, 24 * 60 + 30, "UTC");
        assert_eq!(
            instant,
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 30, 0)
                .single()
                .expect("valid instant")
        );
    }

    #[rstest]
    fn malformed_day_keys_fail_to_parse() {
        assert!(parse_day_key("09-03-2025").is_err());
        assert!(parse_day_key("2025-06-01").is_ok());
    }
}
