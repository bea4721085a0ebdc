//! End-to-end tests wiring the engines through real storage.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Mutex;

use studystreak_core::{
    CoreError, Database, DateAnchor, DeliveryReceipt, DispatchError, Notification,
    NotificationDispatcher, PointsEngine, PollerConfig, ReminderKind, ReminderPoller,
    StreakEngine, Task,
};

#[derive(Default)]
struct CountingDispatcher {
    sent: Mutex<Vec<Notification>>,
}

impl NotificationDispatcher for CountingDispatcher {
    fn send(&self, notification: &Notification) -> Result<DeliveryReceipt, DispatchError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(DeliveryReceipt {
            provider_id: None,
            delivered_at: Utc::now(),
        })
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

#[test]
fn streak_lifecycle_against_storage() {
    let mut db = Database::open_memory().unwrap();
    db.create_profile("ada").unwrap();
    let engine = StreakEngine::new(DateAnchor::Utc);

    // Day 1: first qualifying action.
    let update = engine
        .update_streak_at(&mut db, "ada", day(2025, 6, 10))
        .unwrap();
    assert_eq!(update.current, 1);
    assert!(update.increased);

    // Same day: tasks count, streak does not move.
    let update = engine
        .update_streak_at(&mut db, "ada", day(2025, 6, 10))
        .unwrap();
    assert_eq!(update.current, 1);
    assert_eq!(update.total_tasks_completed, 2);
    assert!(!update.increased);

    // Days 2 and 3: milestone at 3.
    engine
        .update_streak_at(&mut db, "ada", day(2025, 6, 11))
        .unwrap();
    let update = engine
        .update_streak_at(&mut db, "ada", day(2025, 6, 12))
        .unwrap();
    assert_eq!(update.current, 3);
    assert_eq!(update.milestone, Some(3));

    // A gap resets current but keeps longest.
    let update = engine
        .update_streak_at(&mut db, "ada", day(2025, 6, 20))
        .unwrap();
    assert_eq!(update.current, 1);
    assert_eq!(update.longest, 3);

    let state = engine.streak_data(&db, "ada").unwrap();
    assert_eq!(state.current, 1);
    assert_eq!(state.longest, 3);
    assert_eq!(state.total_tasks_completed, 5);
    assert_eq!(state.last_completion_date.as_deref(), Some("2025-06-20"));
}

#[test]
fn streak_update_for_missing_user_fails() {
    let mut db = Database::open_memory().unwrap();
    let engine = StreakEngine::new(DateAnchor::Utc);
    assert!(matches!(
        engine.update_streak_at(&mut db, "ghost", day(2025, 6, 10)),
        Err(CoreError::ProfileNotFound(_))
    ));
    assert!(matches!(
        engine.streak_data(&db, "ghost"),
        Err(CoreError::ProfileNotFound(_))
    ));
}

#[test]
fn points_award_levels_up_and_bumps_counters() {
    let mut db = Database::open_memory().unwrap();
    db.create_profile("ada").unwrap();
    let engine = PointsEngine::new();

    let result = engine.award_points(&mut db, "ada", 100, "habit").unwrap();
    assert_eq!(result.points, 100);
    assert_eq!(result.level, 1);
    assert!(!result.leveled_up);

    // Crosses the 150-point threshold to level 2.
    let result = engine.award_points(&mut db, "ada", 100, "goal").unwrap();
    assert_eq!(result.points, 200);
    assert_eq!(result.level, 2);
    assert!(result.leveled_up);

    // Unknown tag: points only, counters untouched.
    let result = engine
        .award_points(&mut db, "ada", 10, "mystery")
        .unwrap();
    assert_eq!(result.points, 210);

    let profile = db.find_profile("ada").unwrap();
    assert_eq!(profile.game.habits_completed, 1);
    assert_eq!(profile.game.goals_completed, 1);
    assert_eq!(profile.game.features_used, 0);
}

#[test]
fn award_points_for_missing_user_fails() {
    let mut db = Database::open_memory().unwrap();
    let engine = PointsEngine::new();
    assert!(matches!(
        engine.award_points(&mut db, "ghost", 10, "habit"),
        Err(CoreError::ProfileNotFound(_))
    ));
}

#[test]
fn completing_a_task_feeds_streak_and_points() {
    let mut db = Database::open_memory().unwrap();
    db.create_profile("ada").unwrap();
    let task = Task::new("ada", "essay");
    db.insert_task(&task).unwrap();

    db.complete_task(&task.id).unwrap();
    let streak = StreakEngine::new(DateAnchor::Utc);
    let update = streak
        .update_streak_at(&mut db, "ada", day(2025, 6, 10))
        .unwrap();
    assert_eq!(update.current, 1);

    let points = PointsEngine::new();
    let award = points.award_points(&mut db, "ada", 10, "habit").unwrap();
    assert_eq!(award.points, 10);

    // The completed task disappears from the poller's scan set.
    assert!(db.incomplete_tasks().unwrap().is_empty());
}

#[test]
fn delivered_marker_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studystreak.db");

    let task = Task::new("ada", "essay")
        .with_due_date("2025-06-10")
        .with_due_time("14:00")
        .with_reminder(ReminderKind::TwoHours);

    {
        let db = Database::open_at(&path).unwrap();
        db.insert_task(&task).unwrap();
        let mut poller = ReminderPoller::with_config(
            CountingDispatcher::default(),
            PollerConfig::default(),
            DateAnchor::Utc,
        );
        let summary = poller.tick(&db, utc(2025, 6, 10, 11, 58)).unwrap();
        assert_eq!(summary.dispatched, 1);
    }

    // Simulated restart: the durable marker blocks a second delivery
    // even though the fire time is still within the grace window.
    let db = Database::open_at(&path).unwrap();
    let mut poller = ReminderPoller::with_config(
        CountingDispatcher::default(),
        PollerConfig::default(),
        DateAnchor::Utc,
    );
    let summary = poller.tick(&db, utc(2025, 6, 10, 12, 1)).unwrap();
    assert_eq!(summary.dispatched, 0);
    assert_eq!(summary.skipped, 1);
}
