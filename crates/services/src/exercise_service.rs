use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use easel_core::model::{
    AuthUser, Exercise, ExerciseId, ExerciseProgress, ExerciseSubmission, LessonId, NewExercise,
    NewSubmission, ProgressStatus, WarmupCandidate,
};
use easel_core::progress::CategorizedUnit;
use easel_core::Clock;
use remote::repository::{AuthClient, ExerciseRepository};

use crate::error::ExerciseServiceError;

/// Exercise catalog access, the warmup queue, and submission recording.
#[derive(Clone)]
pub struct ExerciseService {
    clock: Clock,
    auth: Arc<dyn AuthClient>,
    exercises: Arc<dyn ExerciseRepository>,
}

impl ExerciseService {
    #[must_use]
    pub fn new(clock: Clock, auth: Arc<dyn AuthClient>, exercises: Arc<dyn ExerciseRepository>) -> Self {
        Self {
            clock,
            auth,
            exercises,
        }
    }

    async fn current_user(&self) -> Result<AuthUser, ExerciseServiceError> {
        self.auth
            .current_user()
            .await?
            .ok_or(ExerciseServiceError::NotAuthenticated)
    }

    /// A lesson's exercises in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError` on backend failures.
    pub async fn exercises_for_lesson(
        &self,
        lesson: LessonId,
    ) -> Result<Vec<Exercise>, ExerciseServiceError> {
        Ok(self.exercises.list_for_lesson(lesson).await?)
    }

    /// One exercise by id.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError` if the exercise does not exist.
    pub async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, ExerciseServiceError> {
        Ok(self.exercises.get_exercise(id).await?)
    }

    /// Add an exercise to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError` on backend failures.
    pub async fn add_exercise(
        &self,
        draft: NewExercise,
    ) -> Result<Exercise, ExerciseServiceError> {
        let exercise = self.exercises.insert_exercise(&draft).await?;
        debug!("added exercise {} ({})", exercise.id, exercise.title);
        Ok(exercise)
    }

    /// Completed, warmup-eligible exercises for the signed-in user, least
    /// recently used first.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn warmup_queue(&self) -> Result<Vec<WarmupCandidate>, ExerciseServiceError> {
        let user = self.current_user().await?;
        Ok(self.exercises.warmup_candidates(user.id).await?)
    }

    /// Record that the signed-in user ran an exercise as a warmup: bump its
    /// use count and stamp the time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the user has no progress row for the exercise.
    pub async fn record_warmup_use(
        &self,
        exercise: ExerciseId,
    ) -> Result<ExerciseProgress, ExerciseServiceError> {
        let user = self.current_user().await?;
        let mut progress = self
            .exercises
            .get_progress(user.id, exercise)
            .await?
            .ok_or(remote::RemoteError::NotFound)?;
        progress.warmup_count += 1;
        progress.last_used_as_warmup = Some(self.clock.now());
        self.exercises.upsert_progress(&progress).await?;
        Ok(progress)
    }

    /// Record a submission for the signed-in user and mark the exercise
    /// completed. An existing progress row keeps its warmup statistics; the
    /// first completion stamps `completed_at` with the current time.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in, or a validation
    /// error from the draft.
    pub async fn submit(
        &self,
        draft: NewSubmission,
    ) -> Result<ExerciseSubmission, ExerciseServiceError> {
        let user = self.current_user().await?;
        let now = self.clock.now();
        let submission = self
            .exercises
            .insert_submission(user.id, &draft, now)
            .await?;

        let progress = match self.exercises.get_progress(user.id, draft.exercise_id()).await? {
            Some(mut existing) => {
                if existing.status != ProgressStatus::Completed {
                    existing.status = ProgressStatus::Completed;
                    existing.completed_at = Some(now);
                }
                existing
            }
            None => ExerciseProgress::completed(user.id, draft.exercise_id(), now),
        };
        if let Err(e) = self.exercises.upsert_progress(&progress).await {
            warn!("submission stored but progress update failed: {e}");
            return Err(e.into());
        }
        debug!("recorded submission for exercise {}", draft.exercise_id());
        Ok(submission)
    }

    /// The signed-in user's completed progress rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn completed(&self) -> Result<Vec<ExerciseProgress>, ExerciseServiceError> {
        let user = self.current_user().await?;
        Ok(self.exercises.completed_for_user(user.id).await?)
    }

    /// Every exercise reduced to its id and category, for the rollup.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseServiceError` on backend failures.
    pub async fn categorized_units(&self) -> Result<Vec<CategorizedUnit>, ExerciseServiceError> {
        Ok(self.exercises.categorized().await?)
    }

    /// Ids of the exercises the signed-in user has completed.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn completed_ids(&self) -> Result<BTreeSet<u64>, ExerciseServiceError> {
        let completed = self.completed().await?;
        Ok(completed
            .iter()
            .map(|row| row.exercise_id.value())
            .collect())
    }

    /// Lessons in which the signed-in user has completed at least one
    /// exercise.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn completed_lesson_ids(&self) -> Result<Vec<LessonId>, ExerciseServiceError> {
        let user = self.current_user().await?;
        Ok(self.exercises.completed_lesson_ids(user.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use easel_core::time::{fixed_clock, fixed_now};
    use remote::{InMemoryRemote, Remote};

    fn seed_exercise(backend: &InMemoryRemote, id: u64, lesson: u64) -> Exercise {
        let exercise = Exercise {
            id: ExerciseId::new(id),
            lesson_id: LessonId::new(lesson),
            title: format!("exercise {id}"),
            description: String::new(),
            order_number: id as u32,
            is_warmup_eligible: true,
            category: Some("Lines".into()),
            created_at: fixed_now(),
            updated_at: fixed_now(),
        };
        backend.seed_exercises([exercise.clone()]);
        exercise
    }

    fn signed_in(backend: &InMemoryRemote) {
        let user = backend.register_user("pat@example.com", "pw");
        backend.set_current_user(Some(user));
    }

    fn service(backend: InMemoryRemote) -> ExerciseService {
        let remote = Remote::from_memory(backend);
        ExerciseService::new(fixed_clock(), remote.auth, remote.exercises)
    }

    #[tokio::test]
    async fn submit_requires_a_session() {
        let backend = InMemoryRemote::new();
        seed_exercise(&backend, 1, 1);
        let service = service(backend);
        let draft = NewSubmission::new(ExerciseId::new(1), "https://img.example/a.png", "", None)
            .unwrap();
        assert!(matches!(
            service.submit(draft).await,
            Err(ExerciseServiceError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn submit_marks_the_exercise_completed() {
        let backend = InMemoryRemote::new();
        seed_exercise(&backend, 1, 1);
        signed_in(&backend);
        let service = service(backend);

        let draft = NewSubmission::new(ExerciseId::new(1), "https://img.example/a.png", "", Some(4))
            .unwrap();
        service.submit(draft).await.unwrap();

        let completed = service.completed().await.unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].status, ProgressStatus::Completed);
        assert_eq!(completed[0].completed_at, Some(fixed_now()));
        assert_eq!(service.completed_ids().await.unwrap(), BTreeSet::from([1]));
    }

    #[tokio::test]
    async fn resubmission_keeps_the_original_completion_time() {
        let backend = InMemoryRemote::new();
        seed_exercise(&backend, 1, 1);
        signed_in(&backend);
        let remote = Remote::from_memory(backend);
        let early = fixed_now() - Duration::days(3);
        let first = ExerciseService::new(
            Clock::fixed(early),
            remote.auth.clone(),
            remote.exercises.clone(),
        );
        let later = ExerciseService::new(fixed_clock(), remote.auth, remote.exercises);

        let draft = NewSubmission::new(ExerciseId::new(1), "https://img.example/a.png", "", None)
            .unwrap();
        first.submit(draft.clone()).await.unwrap();
        later.submit(draft).await.unwrap();

        let completed = later.completed().await.unwrap();
        assert_eq!(completed[0].completed_at, Some(early));
    }

    #[tokio::test]
    async fn warmup_use_bumps_count_and_timestamp() {
        let backend = InMemoryRemote::new();
        seed_exercise(&backend, 1, 1);
        signed_in(&backend);
        let service = service(backend);

        let draft = NewSubmission::new(ExerciseId::new(1), "https://img.example/a.png", "", None)
            .unwrap();
        service.submit(draft).await.unwrap();

        let updated = service.record_warmup_use(ExerciseId::new(1)).await.unwrap();
        assert_eq!(updated.warmup_count, 1);
        assert_eq!(updated.last_used_as_warmup, Some(fixed_now()));
    }

    #[tokio::test]
    async fn warmup_use_without_progress_is_not_found() {
        let backend = InMemoryRemote::new();
        signed_in(&backend);
        let service = service(backend);
        let result = service.record_warmup_use(ExerciseId::new(9)).await;
        assert!(matches!(
            result,
            Err(ExerciseServiceError::Remote(remote::RemoteError::NotFound))
        ));
    }
}
