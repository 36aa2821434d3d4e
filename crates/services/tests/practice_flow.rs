use easel_core::model::{
    Exercise, ExerciseId, Lesson, LessonId, NewChallengeSubmission, NewLesson, NewSubmission,
    ProgressStatus,
};
use easel_core::model::{Challenge, ChallengeId};
use easel_core::time::{fixed_clock, fixed_now};
use remote::{InMemoryRemote, Remote};
use services::AppServices;

fn seeded_backend() -> InMemoryRemote {
    let backend = InMemoryRemote::new();
    backend.seed_lessons([Lesson {
        id: LessonId::new(1),
        title: "Lines and Ellipses".into(),
        description: "Foundation mark-making".into(),
        order_number: 1,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }]);
    backend.seed_exercises([Exercise {
        id: ExerciseId::new(10),
        lesson_id: LessonId::new(1),
        title: "Ghosted lines".into(),
        description: String::new(),
        order_number: 1,
        is_warmup_eligible: true,
        category: Some("Lines".into()),
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }]);
    backend.seed_challenges([Challenge {
        id: ChallengeId::new(1),
        title: "100 boxes".into(),
        description: String::new(),
        target_count: 3,
        order_number: 1,
        created_at: fixed_now(),
        updated_at: fixed_now(),
    }]);
    backend
}

#[tokio::test]
async fn sign_up_practice_and_track_flow() {
    let backend = seeded_backend();
    let remote = Remote::from_memory(backend);
    let services = AppServices::new(&remote, fixed_clock());

    services
        .auth()
        .sign_up("pat@example.com", "secret")
        .await
        .expect("sign up");

    // Lesson catalog and detail.
    let lessons = services.lessons().list_lessons().await.expect("lessons");
    assert_eq!(lessons.len(), 1);
    let (lesson, exercises) = services
        .lessons()
        .get_lesson(LessonId::new(1))
        .await
        .expect("lesson detail");
    assert_eq!(lesson.title, "Lines and Ellipses");
    assert_eq!(exercises.len(), 1);

    // Complete the exercise by submitting work.
    let draft = NewSubmission::new(ExerciseId::new(10), "https://img.example/a.png", "", Some(4))
        .expect("draft");
    services.exercises().submit(draft).await.expect("submit");

    let completed = services.exercises().completed().await.expect("completed");
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].status, ProgressStatus::Completed);
    assert_eq!(
        services
            .exercises()
            .completed_lesson_ids()
            .await
            .expect("lesson ids"),
        vec![LessonId::new(1)]
    );

    // The completed, warmup-eligible exercise shows up in the queue.
    let queue = services.exercises().warmup_queue().await.expect("queue");
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].exercise.id, ExerciseId::new(10));

    // Work a challenge up to its target.
    let challenge_submission = |count| {
        NewChallengeSubmission::new(ChallengeId::new(1), count, "https://img.example/c.png", "")
            .expect("challenge draft")
    };
    let progress = services
        .challenges()
        .submit_progress(challenge_submission(2))
        .await
        .expect("first challenge submission");
    assert_eq!(progress.status, ProgressStatus::InProgress);
    let progress = services
        .challenges()
        .submit_progress(challenge_submission(1))
        .await
        .expect("second challenge submission");
    assert_eq!(progress.status, ProgressStatus::Completed);

    // Dashboard numbers reflect the session's work.
    let stats = services.account().stats().await.expect("stats");
    assert_eq!(stats.total_lessons, 1);
    assert_eq!(stats.completed_lessons, 1);
    assert_eq!(stats.completed_exercises, 1);
    assert_eq!(stats.completed_challenges, 1);
    assert!(stats.active_challenges.is_empty());
}

#[tokio::test]
async fn catalog_writes_are_visible_to_readers() {
    let services = AppServices::in_memory(fixed_clock());

    let lesson = services
        .lessons()
        .add_lesson(NewLesson::new("Perspective", "Boxes in space", 2).expect("draft"))
        .await
        .expect("add lesson");

    let lessons = services.lessons().list_lessons().await.expect("lessons");
    assert_eq!(lessons, vec![lesson]);
}

#[tokio::test]
async fn export_bundles_the_users_rows() {
    let backend = seeded_backend();
    let remote = Remote::from_memory(backend);
    let services = AppServices::new(&remote, fixed_clock());
    services
        .auth()
        .sign_up("pat@example.com", "secret")
        .await
        .expect("sign up");
    services.account().profile().await.expect("profile");

    let bundle = services.account().export_data().await.expect("export");
    assert_eq!(
        bundle["profile"]["name"],
        serde_json::Value::String("pat".into())
    );
    assert!(bundle["drawings"].as_array().expect("array").is_empty());
}
