use std::sync::Arc;

use async_trait::async_trait;

use easel_core::model::{
    Challenge, ChallengeId, Exercise, ExerciseId, Lesson, LessonId, NewChallengeSubmission,
    NewLesson, NewSubmission,
};
use easel_core::time::{fixed_clock, fixed_now};
use remote::repository::LessonRepository;
use remote::{InMemoryRemote, Remote, RemoteError};
use services::{AppServices, LessonService};
use stores::{ChallengesStore, ExercisesStore, LessonsStore};

struct UnreachableLessons;

#[async_trait]
impl LessonRepository for UnreachableLessons {
    async fn list_lessons(&self) -> Result<Vec<Lesson>, RemoteError> {
        Err(RemoteError::Operation("backend unavailable".into()))
    }

    async fn get_lesson(&self, _id: LessonId) -> Result<Lesson, RemoteError> {
        Err(RemoteError::Operation("backend unavailable".into()))
    }

    async fn insert_lesson(&self, _draft: &NewLesson) -> Result<Lesson, RemoteError> {
        Err(RemoteError::Operation("backend unavailable".into()))
    }
}

fn seed_exercise(backend: &InMemoryRemote, id: u64, category: &str) {
    backend.seed_exercises([Exercise {
        id: ExerciseId::new(id),
        lesson_id: LessonId::new(1),
        title: format!("exercise {id}"),
        description: String::new(),
        order_number: id as u32,
        is_warmup_eligible: false,
        category: Some(category.into()),
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }]);
}

#[tokio::test]
async fn failures_surface_in_the_result_and_last_error() {
    let backend = InMemoryRemote::new();
    let remote = Remote::from_memory(backend);
    let service = Arc::new(LessonService::new(
        fixed_clock(),
        remote.auth.clone(),
        Arc::new(UnreachableLessons),
        remote.exercises.clone(),
        remote.notes.clone(),
    ));
    let mut store = LessonsStore::new(service);

    let result = store.load_lessons().await;
    assert!(!result.is_ok());
    assert_eq!(result.error.as_deref(), Some("backend unavailable"));
    assert_eq!(store.last_error(), Some("backend unavailable"));
    assert!(!store.busy());
    assert!(store.lessons().is_empty());
}

#[tokio::test]
async fn successes_clear_the_previous_error() {
    let services = AppServices::in_memory(fixed_clock());
    let mut store = LessonsStore::new(services.lessons());

    // Saving notes with no lesson open fails at the store boundary.
    let result = store.save_notes("anything", "").await;
    assert!(!result.is_ok());
    assert!(store.last_error().is_some());

    let result = store.load_lessons().await;
    assert!(result.is_ok());
    assert_eq!(store.last_error(), None);
}

#[tokio::test]
async fn tracking_views_reflect_loaded_data() {
    let backend = InMemoryRemote::new();
    seed_exercise(&backend, 1, "Lines");
    seed_exercise(&backend, 2, "Lines");
    seed_exercise(&backend, 3, "Ellipses");
    let user = backend.register_user("pat@example.com", "pw");
    backend.set_current_user(Some(user));
    let remote = Remote::from_memory(backend);
    let services = AppServices::new(&remote, fixed_clock());
    let mut store = ExercisesStore::new(services.exercises());

    let draft =
        NewSubmission::new(ExerciseId::new(1), "https://img.example/a.png", "", None).unwrap();
    assert!(store.submit(draft).await.is_ok());
    assert!(store.load_tracking_data().await.is_ok());

    assert_eq!(store.completion_percentage(), 33);
    assert_eq!(store.recent_completed().len(), 1);

    let streak = store.streak(fixed_now().date_naive());
    assert_eq!(streak.current, 1);
    assert_eq!(streak.best, 1);

    let rollup = store.category_progress();
    assert_eq!(rollup.len(), 2);
    assert_eq!(rollup[0].name, "Ellipses");
    assert_eq!((rollup[0].completed, rollup[0].total), (0, 1));
    assert_eq!(rollup[1].name, "Lines");
    assert_eq!((rollup[1].completed, rollup[1].total), (1, 2));

    let months = store.monthly_activity(3, fixed_now().date_naive());
    assert_eq!(months.len(), 3);
    assert_eq!(months[2].label, "Nov 2023");
    assert_eq!(months[2].count, 1);
    assert_eq!(months[0].count + months[1].count, 0);
}

#[tokio::test]
async fn active_challenges_are_ordered_by_how_close_they_are() {
    let backend = InMemoryRemote::new();
    for (id, target) in [(1_u64, 100_u32), (2, 10)] {
        backend.seed_challenges([Challenge {
            id: ChallengeId::new(id),
            title: format!("challenge {id}"),
            description: String::new(),
            target_count: target,
            order_number: id as u32,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }]);
    }
    let user = backend.register_user("pat@example.com", "pw");
    backend.set_current_user(Some(user));
    let remote = Remote::from_memory(backend);
    let services = AppServices::new(&remote, fixed_clock());
    let mut store = ChallengesStore::new(services.challenges());

    let submit = |id, count| {
        NewChallengeSubmission::new(ChallengeId::new(id), count, "https://img.example/c.png", "")
            .unwrap()
    };
    // 5/100 on the first, 5/10 on the second.
    assert!(store.submit_progress(submit(1, 5)).await.is_ok());
    assert!(store.submit_progress(submit(2, 5)).await.is_ok());
    assert!(store.load_active().await.is_ok());

    let ordered = store.active_by_completion_ratio();
    assert_eq!(ordered.len(), 2);
    assert_eq!(ordered[0].1.id, ChallengeId::new(2));
    assert_eq!(ordered[1].1.id, ChallengeId::new(1));
}
