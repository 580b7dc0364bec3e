use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use mockable::MockClock;
use rstest::rstest;
use uuid::Uuid;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    MockPreferencesRepository, MockShadowTaskRepository, ScheduledEvent, ShadowProfile,
    ShadowTaskRepositoryError, TaskCompletion,
};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 14, 5, 0)
        .single()
        .expect("valid instant")
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, hour, minute, 0)
        .single()
        .expect("valid instant")
}

fn task(anchor: Option<TimeAnchor>, order_hint: Option<i32>, created_secs: i64) -> AnchoredTask {
    AnchoredTask {
        id: Uuid::new_v4(),
        anchor,
        order_hint,
        created_at: Utc
            .timestamp_opt(created_secs, 0)
            .single()
            .expect("valid instant"),
    }
}

fn mirror(anchor: Option<TimeAnchor>, order_hint: Option<i32>, created_secs: i64) -> MirroredTask {
    let inner = task(anchor, order_hint, created_secs);
    MirroredTask {
        shadow_task_id: inner.id,
        title: "Stretch".to_owned(),
        anchor: inner.anchor,
        order_hint: inner.order_hint,
        created_at: inner.created_at,
    }
}

#[rstest]
fn anchor_groups_space_slots_fifteen_minutes_apart() {
    let first = task(Some(TimeAnchor::Morning), Some(1), 10);
    let second = task(Some(TimeAnchor::Morning), Some(2), 5);
    let evening = task(Some(TimeAnchor::Evening), None, 1);

    let layout = layout_minutes(&[evening.clone(), second.clone(), first.clone()]);

    assert_eq!(
        layout,
        vec![(first.id, 540), (second.id, 555), (evening.id, 1080)]
    );
}

#[rstest]
fn missing_order_hint_sorts_after_hinted_tasks() {
    let hinted = task(Some(TimeAnchor::Midday), Some(9), 50);
    let unhinted = task(Some(TimeAnchor::Midday), None, 1);

    let layout = layout_minutes(&[unhinted.clone(), hinted.clone()]);

    assert_eq!(layout, vec![(hinted.id, 780), (unhinted.id, 795)]);
}

#[rstest]
fn unanchored_tasks_fall_back_to_mid_afternoon() {
    let floating = task(None, None, 1);
    let layout = layout_minutes(&[floating.clone()]);
    assert_eq!(layout, vec![(floating.id, 900)]);
}

#[rstest]
fn creation_time_breaks_ties_within_a_group() {
    let older = task(Some(TimeAnchor::Night), None, 10);
    let newer = task(Some(TimeAnchor::Night), None, 20);

    let layout = layout_minutes(&[newer.clone(), older.clone()]);

    assert_eq!(layout, vec![(older.id, 1260), (newer.id, 1275)]);
}

#[rstest]
fn plan_day_resolves_local_wall_clock_to_utc() {
    let ghost = mirror(Some(TimeAnchor::Morning), Some(1), 10);
    let date = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date");

    let (plan, instances) = plan_day(
        std::slice::from_ref(&ghost),
        date,
        "2025-06-01",
        "Asia/Kolkata",
    );

    assert_eq!(plan.planned_date_local, "2025-06-01");
    assert_eq!(plan.timezone, "Asia/Kolkata");
    assert_eq!(plan.slots.len(), 1);
    // 09:00 in Kolkata is 03:30 UTC; instances run for ten minutes.
    assert_eq!(instances[0].planned_start_at, at(3, 30));
    assert_eq!(instances[0].planned_end_at, at(3, 40));
    assert_eq!(instances[0].shadow_task_id, ghost.shadow_task_id);
}

#[rstest]
fn snapshot_positions_shadow_by_elapsed_slots() {
    let done_early = task(Some(TimeAnchor::Morning), Some(1), 1);
    let done_late = task(Some(TimeAnchor::Morning), Some(2), 2);
    let skipped = task(Some(TimeAnchor::Morning), Some(3), 3);
    let evening = task(Some(TimeAnchor::Evening), None, 4);
    let tasks = vec![
        done_early.clone(),
        done_late.clone(),
        skipped.clone(),
        evening,
    ];

    let completions = vec![
        TaskCompletion {
            task_id: done_early.id,
            completed_at: at(9, 0),
        },
        TaskCompletion {
            task_id: done_late.id,
            completed_at: at(13, 30),
        },
    ];

    // 14:05 UTC with tz=UTC: slots 540/555/570 have elapsed, 1080 has not.
    let snapshot = pace_snapshot(&tasks, &completions, &[], "UTC", fixed_now());

    assert_eq!(snapshot.metrics.shadow_distance_now, 3);
    assert_eq!(snapshot.metrics.delta_now, -1);
    assert_eq!(snapshot.metrics.user_speed_now, 1);
    assert_eq!(snapshot.metrics.shadow_speed_now, 0);
    // Completions at minutes 540 and 810 against slots 540 and 555.
    assert_eq!(snapshot.metrics.time_saved_minutes, -255);
    // Two completions leave a single gap, which is trivially even.
    assert_eq!(snapshot.metrics.pace_consistency, Some(1.0));
    // Every elapsed slot is passed, completed or not, in layout order.
    assert_eq!(
        snapshot.passed_task_ids,
        vec![done_early.id, done_late.id, skipped.id]
    );
}

#[rstest]
fn calendar_events_override_the_anchor_slot_for_today() {
    let pinned = task(Some(TimeAnchor::Morning), Some(1), 1);
    // The event moves the 09:00 anchor slot to 15:00, which has not elapsed
    // at 14:05 but falls within the next hour.
    let events = vec![ScheduledEvent {
        task_id: pinned.id,
        due_at: at(15, 0),
    }];

    let snapshot = pace_snapshot(
        std::slice::from_ref(&pinned),
        &[],
        &events,
        "UTC",
        fixed_now(),
    );

    assert_eq!(snapshot.metrics.shadow_distance_now, 0);
    assert_eq!(snapshot.metrics.shadow_speed_now, 1);
    assert!(snapshot.passed_task_ids.is_empty());
}

#[rstest]
fn events_on_another_day_leave_the_layout_alone() {
    let pinned = task(Some(TimeAnchor::Morning), Some(1), 1);
    let events = vec![ScheduledEvent {
        task_id: pinned.id,
        due_at: at(15, 0) + chrono::Duration::days(1),
    }];

    let snapshot = pace_snapshot(
        std::slice::from_ref(&pinned),
        &[],
        &events,
        "UTC",
        fixed_now(),
    );

    assert_eq!(snapshot.metrics.shadow_distance_now, 1);
    assert_eq!(snapshot.passed_task_ids, vec![pinned.id]);
}

#[rstest]
fn time_saved_skips_completions_without_a_slot() {
    let pinned = task(Some(TimeAnchor::Morning), Some(1), 1);
    let completions = vec![
        TaskCompletion {
            task_id: pinned.id,
            completed_at: at(8, 30),
        },
        TaskCompletion {
            task_id: Uuid::new_v4(),
            completed_at: at(7, 0),
        },
    ];

    let snapshot = pace_snapshot(
        std::slice::from_ref(&pinned),
        &completions,
        &[],
        "UTC",
        fixed_now(),
    );

    // Finishing the 09:00 slot at 08:30 banks thirty minutes; the slotless
    // row contributes nothing.
    assert_eq!(snapshot.metrics.time_saved_minutes, 30);
}

#[rstest]
fn evenly_spaced_completions_score_full_consistency() {
    let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
    let completions = vec![
        TaskCompletion {
            task_id: ids[0],
            completed_at: at(10, 0),
        },
        TaskCompletion {
            task_id: ids[1],
            completed_at: at(10, 30),
        },
        TaskCompletion {
            task_id: ids[2],
            completed_at: at(11, 0),
        },
    ];

    let consistency = pace_consistency(&completions).expect("two gaps");
    assert!((consistency - 1.0).abs() < 1e-9);
}

#[rstest]
fn repeat_completions_of_one_task_still_count_as_rows() {
    let id = Uuid::new_v4();
    let completions = vec![
        TaskCompletion {
            task_id: id,
            completed_at: at(10, 0),
        },
        TaskCompletion {
            task_id: id,
            completed_at: at(10, 30),
        },
        TaskCompletion {
            task_id: id,
            completed_at: at(11, 0),
        },
    ];

    let consistency = pace_consistency(&completions).expect("two gaps");
    assert!((consistency - 1.0).abs() < 1e-9);
}

#[rstest]
fn simultaneous_completions_score_zero_consistency() {
    let completions = vec![
        TaskCompletion {
            task_id: Uuid::new_v4(),
            completed_at: at(10, 0),
        },
        TaskCompletion {
            task_id: Uuid::new_v4(),
            completed_at: at(10, 0),
        },
    ];

    // A zero mean gap cannot carry a coefficient of variation.
    assert_eq!(pace_consistency(&completions), Some(0.0));
}

#[rstest]
#[tokio::test]
async fn dry_run_requires_a_shadow_profile() {
    let mut shadow = MockShadowTaskRepository::new();
    shadow.expect_profile_for_user().returning(|_| Ok(None));
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(fixed_now());

    let service = SchedulerService::new(
        Arc::new(shadow),
        Arc::new(MockPreferencesRepository::new()),
        Arc::new(clock),
        "UTC",
    );

    let err = service
        .dry_run_today(&UserId::random())
        .await
        .expect_err("no profile");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn materialise_reports_created_against_candidates() {
    let user = UserId::random();
    let profile = ShadowProfile {
        id: Uuid::new_v4(),
        user_id: user.clone(),
    };

    let mut shadow = MockShadowTaskRepository::new();
    let returned = profile.clone();
    shadow
        .expect_profile_for_user()
        .returning(move |_| Ok(Some(returned.clone())));
    shadow.expect_active_mirrors().returning(|_| {
        Ok(vec![
            mirror(Some(TimeAnchor::Morning), Some(1), 1),
            mirror(Some(TimeAnchor::Morning), Some(2), 2),
        ])
    });
    // One of the two rows already existed from an earlier run.
    shadow.expect_insert_instances().returning(|instances| {
        assert_eq!(instances.len(), 2);
        Ok(1)
    });

    let mut prefs = MockPreferencesRepository::new();
    prefs.expect_timezone_for_user().returning(|_| Ok(None));
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(fixed_now());

    let service = SchedulerService::new(Arc::new(shadow), Arc::new(prefs), Arc::new(clock), "UTC");

    let outcome = service.materialise_today(&user).await.expect("materialised");
    assert_eq!(outcome.planned_date_local, "2025-06-01");
    assert_eq!(outcome.created_instances, 1);
    assert_eq!(outcome.total_candidates, 2);
}

#[rstest]
#[tokio::test]
async fn batch_materialisation_isolates_failing_profiles() {
    let broken = ShadowProfile {
        id: Uuid::new_v4(),
        user_id: UserId::random(),
    };
    let healthy = ShadowProfile {
        id: Uuid::new_v4(),
        user_id: UserId::random(),
    };

    let mut shadow = MockShadowTaskRepository::new();
    let listed = vec![broken.clone(), healthy.clone()];
    shadow
        .expect_profiles()
        .returning(move || Ok(listed.clone()));
    let broken_id = broken.id;
    shadow.expect_active_mirrors().returning(move |profile_id| {
        if profile_id == broken_id {
            Err(ShadowTaskRepositoryError::query("relation vanished"))
        } else {
            Ok(vec![mirror(None, None, 1)])
        }
    });
    shadow.expect_insert_instances().returning(|_| Ok(1));

    let mut prefs = MockPreferencesRepository::new();
    prefs.expect_timezone_for_user().returning(|_| Ok(None));
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(fixed_now());

    let service = SchedulerService::new(Arc::new(shadow), Arc::new(prefs), Arc::new(clock), "UTC");

    let report = service.materialise_all().await.expect("report");
    assert_eq!(report.total, 2);
    assert_eq!(report.results.len(), 2);
    assert!(!report.results[0].ok);
    assert!(report.results[0].error.is_some());
    assert!(report.results[1].ok);
    assert!(report.results[1].detail.is_some());
}
