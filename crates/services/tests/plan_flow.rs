mod common;

use std::sync::Arc;

use common::{FakeGenerator, flaky_storage, material, slow_completion_storage};
use services::{PersistenceMirror, PlanTracker, PlanTrackerError};
use storage::Storage;
use study_core::model::UserId;
use study_core::time::fixed_clock;

fn tracker(generator: Arc<FakeGenerator>, mirror: PersistenceMirror) -> PlanTracker {
    PlanTracker::new(material(), generator, mirror, fixed_clock())
}

#[tokio::test]
async fn toggling_a_day_twice_restores_ratio() {
    let mut tracker = tracker(FakeGenerator::new(), PersistenceMirror::disabled());
    tracker.generate(3).await.unwrap();
    let before = tracker.completion_ratio();

    assert!(tracker.toggle_day(3).unwrap());
    assert!((tracker.completion_ratio() - 1.0 / 3.0).abs() < f64::EPSILON);
    assert!(!tracker.toggle_day(3).unwrap());

    assert!(!tracker.is_day_complete(3));
    assert!((tracker.completion_ratio() - before).abs() < f64::EPSILON);
    assert!(tracker.completion_ratio().abs() < f64::EPSILON);
}

#[tokio::test]
async fn requested_days_are_clamped() {
    let generator = FakeGenerator::new();
    let mut tracker = tracker(Arc::clone(&generator), PersistenceMirror::disabled());

    tracker.generate(0).await.unwrap();
    assert_eq!(generator.last_days(), 1);
    tracker.generate(365).await.unwrap();
    assert_eq!(generator.last_days(), 90);
    assert_eq!(tracker.days(), 90);
}

#[tokio::test]
async fn toggle_needs_a_known_day() {
    let mut tracker = tracker(FakeGenerator::new(), PersistenceMirror::disabled());
    assert!(matches!(tracker.toggle_day(1), Err(PlanTrackerError::NoPlan)));
    assert!(tracker.completion_ratio().abs() < f64::EPSILON);

    tracker.generate(3).await.unwrap();
    assert!(matches!(
        tracker.toggle_day(4),
        Err(PlanTrackerError::UnknownDay(4))
    ));
}

#[tokio::test]
async fn failed_generation_keeps_previous_plan() {
    let generator = FakeGenerator::new();
    let mut tracker = tracker(Arc::clone(&generator), PersistenceMirror::disabled());
    tracker.generate(3).await.unwrap();
    tracker.toggle_day(1).unwrap();

    generator.set_failing(true);
    let err = tracker.generate(5).await.unwrap_err();
    assert!(matches!(err, PlanTrackerError::Generation(_)));
    assert_eq!(tracker.plan().unwrap().days().len(), 3);
    assert!(tracker.is_day_complete(1));
}

#[tokio::test]
async fn new_plan_clears_progress() {
    let mut tracker = tracker(FakeGenerator::new(), PersistenceMirror::disabled());
    tracker.generate(3).await.unwrap();
    tracker.toggle_day(2).unwrap();

    tracker.generate(3).await.unwrap();
    assert!(!tracker.is_day_complete(2));
    assert_eq!(tracker.progress().completed_count(), 0);
}

#[tokio::test]
async fn reset_drops_plan() {
    let mut tracker = tracker(FakeGenerator::new(), PersistenceMirror::disabled());
    tracker.generate(3).await.unwrap();
    tracker.toggle_day(1).unwrap();

    tracker.reset();
    assert!(tracker.plan().is_none());
    assert_eq!(tracker.progress().completed_count(), 0);
}

#[tokio::test]
async fn progress_is_mirrored_for_saved_plan() {
    let storage = Storage::in_memory();
    let mirror = PersistenceMirror::new(UserId::new_anonymous(), storage.clone());
    let mut tracker = tracker(FakeGenerator::new(), mirror);

    let plan_id = tracker.generate(3).await.unwrap().id().unwrap();
    tracker.toggle_day(2).unwrap();
    tracker.flush().await;

    let stored = storage.plans.get_plan_progress(plan_id).await.unwrap();
    assert!(stored.is_complete(2));
    assert!(!stored.is_complete(1));
}

#[tokio::test]
async fn failed_progress_write_keeps_local_flag() {
    let mirror = PersistenceMirror::new(UserId::new_anonymous(), flaky_storage());
    let mut tracker = tracker(FakeGenerator::new(), mirror);
    tracker.generate(3).await.unwrap();

    tracker.toggle_day(1).unwrap();
    tracker.flush().await;

    assert!(tracker.is_day_complete(1));
    assert_eq!(tracker.mirror().failed_writes(), 1);
}

#[tokio::test]
async fn stored_progress_follows_toggle_order() {
    let storage = slow_completion_storage();
    let mirror = PersistenceMirror::new(UserId::new_anonymous(), storage.clone());
    let mut tracker = tracker(FakeGenerator::new(), mirror);
    let plan_id = tracker.generate(3).await.unwrap().id().unwrap();

    assert!(tracker.toggle_day(3).unwrap());
    assert!(!tracker.toggle_day(3).unwrap());
    tracker.flush().await;

    let stored = storage.plans.get_plan_progress(plan_id).await.unwrap();
    assert_eq!(stored.is_complete(3), tracker.is_day_complete(3));
    assert!(!stored.is_complete(3));
    assert_eq!(tracker.mirror().pending_writes(), 0);
    assert_eq!(tracker.mirror().failed_writes(), 0);
}
