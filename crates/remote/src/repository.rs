use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use easel_core::model::{
    AuthUser, Challenge, ChallengeId, ChallengeProgress, Drawing, DrawingPrompt, Exercise,
    ExerciseId, ExerciseProgress, ExerciseSubmission, Lesson, LessonId, LessonNote,
    NewChallengeSubmission, NewDrawing, NewExercise, NewLesson, NewPrompt, NewSubmission,
    ProfilePatch, UserActivity, UserDrawing, UserId, UserProfile, WarmupCandidate,
};
use easel_core::progress::CategorizedUnit;

/// Failures surfaced by the remote backend.
///
/// `NotFound` is reserved for the backend's "no matching row" signal so
/// callers can branch on absence; every other backend failure collapses into
/// `Operation` with the underlying message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("not found")]
    NotFound,

    #[error("remote operation failed: {0}")]
    Operation(String),
}

/// Session-bound identity and password primitives.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// The user bound to the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the backend cannot be reached.
    async fn current_user(&self) -> Result<Option<AuthUser>, RemoteError>;

    /// Password sign-in; on success the session is bound to the user.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Operation` for rejected credentials.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError>;

    /// Register a new account and bind the session to it.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if registration is rejected.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError>;

    /// Drop the current session.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if the backend rejects the request.
    async fn sign_out(&self) -> Result<(), RemoteError>;

    /// Change the current user's password.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotAuthenticated` without a session.
    async fn update_password(&self, new_password: &str) -> Result<(), RemoteError>;

    /// Remove the user's auth record entirely.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` if deletion fails.
    async fn delete_user(&self, user: UserId) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// All lessons ordered by `order_number`.
    async fn list_lessons(&self) -> Result<Vec<Lesson>, RemoteError>;

    /// Fetch one lesson.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` when the lesson does not exist.
    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, RemoteError>;

    /// Insert a lesson and return the stored row.
    async fn insert_lesson(&self, draft: &NewLesson) -> Result<Lesson, RemoteError>;
}

#[async_trait]
pub trait LessonNoteRepository: Send + Sync {
    /// The user's note for a lesson, if one exists.
    async fn get_note(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<LessonNote>, RemoteError>;

    /// Insert a new note row.
    async fn insert_note(&self, note: &LessonNote) -> Result<LessonNote, RemoteError>;

    /// Overwrite the note/reflection text of an existing row.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` when no row exists for the pair.
    async fn update_note(&self, note: &LessonNote) -> Result<LessonNote, RemoteError>;

    /// Delete the user's note for a lesson, ignoring absence.
    async fn delete_note(&self, user: UserId, lesson: LessonId) -> Result<(), RemoteError>;

    /// Delete every note the user owns.
    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait ExerciseRepository: Send + Sync {
    /// Exercises of one lesson ordered by `order_number`.
    async fn list_for_lesson(&self, lesson: LessonId) -> Result<Vec<Exercise>, RemoteError>;

    /// Fetch one exercise.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` when the exercise does not exist.
    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, RemoteError>;

    /// Insert an exercise and return the stored row.
    async fn insert_exercise(&self, draft: &NewExercise) -> Result<Exercise, RemoteError>;

    /// Every exercise reduced to id + category, for the rollup.
    async fn categorized(&self) -> Result<Vec<CategorizedUnit>, RemoteError>;

    /// Insert a submission row stamped at `created_at`.
    async fn insert_submission(
        &self,
        user: UserId,
        draft: &NewSubmission,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<ExerciseSubmission, RemoteError>;

    /// The user's progress row against one exercise, if any.
    async fn get_progress(
        &self,
        user: UserId,
        exercise: ExerciseId,
    ) -> Result<Option<ExerciseProgress>, RemoteError>;

    /// Insert or replace a progress row keyed by (user, exercise).
    async fn upsert_progress(&self, progress: &ExerciseProgress) -> Result<(), RemoteError>;

    /// Completed progress rows, newest completion first.
    async fn completed_for_user(&self, user: UserId)
        -> Result<Vec<ExerciseProgress>, RemoteError>;

    /// Distinct lessons the user has completed at least one exercise of.
    async fn completed_lesson_ids(&self, user: UserId) -> Result<Vec<LessonId>, RemoteError>;

    /// Completed, warmup-eligible exercises ordered by `warmup_count`, then
    /// least-recently used as warmup.
    async fn warmup_candidates(&self, user: UserId)
        -> Result<Vec<WarmupCandidate>, RemoteError>;

    /// Delete the user's progress and submissions.
    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// All challenges ordered by `order_number`.
    async fn list_challenges(&self) -> Result<Vec<Challenge>, RemoteError>;

    /// Fetch one challenge.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` when the challenge does not exist.
    async fn get_challenge(&self, id: ChallengeId) -> Result<Challenge, RemoteError>;

    /// The user's progress row against one challenge, if any.
    async fn get_progress(
        &self,
        user: UserId,
        challenge: ChallengeId,
    ) -> Result<Option<ChallengeProgress>, RemoteError>;

    /// Insert a fresh progress row.
    async fn insert_progress(
        &self,
        progress: &ChallengeProgress,
    ) -> Result<ChallengeProgress, RemoteError>;

    /// Insert or replace a progress row keyed by (user, challenge).
    async fn upsert_progress(&self, progress: &ChallengeProgress) -> Result<(), RemoteError>;

    /// Insert a submission row stamped at `created_at`.
    async fn insert_submission(
        &self,
        user: UserId,
        draft: &NewChallengeSubmission,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), RemoteError>;

    /// Completed progress rows for the user.
    async fn completed_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ChallengeProgress>, RemoteError>;

    /// In-progress rows joined with their challenge.
    async fn active_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(ChallengeProgress, Challenge)>, RemoteError>;

    /// Delete the user's progress and submissions.
    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait DrawingRepository: Send + Sync {
    /// All prompts, newest first.
    async fn list_prompts(&self) -> Result<Vec<DrawingPrompt>, RemoteError>;

    /// Insert a prompt owned by `user`, stamped at `created_at`.
    async fn insert_prompt(
        &self,
        user: UserId,
        draft: &NewPrompt,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<DrawingPrompt, RemoteError>;

    /// Insert a drawing owned by `user`, stamped at `created_at`.
    async fn insert_drawing(
        &self,
        user: UserId,
        draft: &NewDrawing,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Drawing, RemoteError>;

    /// The user's drawings joined with their prompt, newest first.
    async fn drawings_for_user(&self, user: UserId) -> Result<Vec<UserDrawing>, RemoteError>;

    /// Delete the user's drawings and prompts.
    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// The user's profile row, if one exists.
    async fn get_profile(&self, user: UserId) -> Result<Option<UserProfile>, RemoteError>;

    /// Insert a profile row.
    async fn insert_profile(&self, profile: &UserProfile) -> Result<UserProfile, RemoteError>;

    /// Apply a partial update, bumping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::NotFound` when the profile does not exist.
    async fn update_profile(
        &self,
        user: UserId,
        patch: &ProfilePatch,
        updated_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<UserProfile, RemoteError>;

    /// Delete the profile row, ignoring absence.
    async fn delete_profile(&self, user: UserId) -> Result<(), RemoteError>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// The user's newest activity entries, up to `limit`.
    async fn recent_for_user(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<UserActivity>, RemoteError>;

    /// Every activity entry the user owns.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<UserActivity>, RemoteError>;

    /// Delete the user's activity history.
    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError>;
}

/// Aggregates the remote backend behind trait objects for easy swapping.
#[derive(Clone)]
pub struct Remote {
    pub auth: Arc<dyn AuthClient>,
    pub lessons: Arc<dyn LessonRepository>,
    pub notes: Arc<dyn LessonNoteRepository>,
    pub exercises: Arc<dyn ExerciseRepository>,
    pub challenges: Arc<dyn ChallengeRepository>,
    pub drawings: Arc<dyn DrawingRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub activity: Arc<dyn ActivityRepository>,
}

impl Remote {
    /// A fully in-memory backend for tests and prototyping.
    #[must_use]
    pub fn in_memory() -> Self {
        let backend = crate::memory::InMemoryRemote::new();
        Self::from_memory(backend)
    }

    /// Wrap an existing in-memory backend (useful when tests need the
    /// concrete handle for seeding).
    #[must_use]
    pub fn from_memory(backend: crate::memory::InMemoryRemote) -> Self {
        let shared = Arc::new(backend);
        Self {
            auth: shared.clone(),
            lessons: shared.clone(),
            notes: shared.clone(),
            exercises: shared.clone(),
            challenges: shared.clone(),
            drawings: shared.clone(),
            profiles: shared.clone(),
            activity: shared,
        }
    }

    /// A backend speaking the hosted PostgREST/GoTrue protocol.
    ///
    /// # Errors
    ///
    /// Returns `RestInitError` when the base URL is malformed.
    pub fn postgrest(
        config: crate::postgrest::RestConfig,
    ) -> Result<Self, crate::postgrest::RestInitError> {
        let client = Arc::new(crate::postgrest::RestRemote::new(config)?);
        Ok(Self {
            auth: client.clone(),
            lessons: client.clone(),
            notes: client.clone(),
            exercises: client.clone(),
            challenges: client.clone(),
            drawings: client.clone(),
            profiles: client.clone(),
            activity: client,
        })
    }
}
