//! In-memory backend for tests and prototyping.
//!
//! One mutex-guarded state bag stands in for every backend table, plus a
//! credential map and current-user slot so the auth flows are exercisable
//! without a network.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use easel_core::model::{
    AuthUser, Challenge, ChallengeId, ChallengeProgress, Drawing, DrawingId, DrawingPrompt,
    Exercise, ExerciseId, ExerciseProgress, ExerciseSubmission, Lesson, LessonId, LessonNote,
    NewChallengeSubmission, NewDrawing, NewExercise, NewLesson, NewPrompt, NewSubmission, NoteId,
    ProfilePatch, ProgressStatus, PromptId, SubmissionId, UserActivity, UserDrawing, UserId,
    UserProfile, WarmupCandidate,
};
use easel_core::progress::CategorizedUnit;

use crate::repository::{
    ActivityRepository, AuthClient, ChallengeRepository, DrawingRepository, ExerciseRepository,
    LessonNoteRepository, LessonRepository, ProfileRepository, RemoteError,
};

// Submission history is append-only; only ownership is consulted on delete.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct StoredChallengeSubmission {
    user_id: UserId,
    challenge_id: ChallengeId,
    count: u32,
}

#[derive(Default)]
struct State {
    next_id: u64,
    current_user: Option<AuthUser>,
    credentials: HashMap<String, (UserId, String)>,
    lessons: BTreeMap<u64, Lesson>,
    exercises: BTreeMap<u64, Exercise>,
    challenges: BTreeMap<u64, Challenge>,
    notes: HashMap<(UserId, LessonId), LessonNote>,
    exercise_progress: HashMap<(UserId, ExerciseId), ExerciseProgress>,
    exercise_submissions: Vec<ExerciseSubmission>,
    challenge_progress: HashMap<(UserId, ChallengeId), ChallengeProgress>,
    challenge_submissions: Vec<StoredChallengeSubmission>,
    prompts: BTreeMap<u64, DrawingPrompt>,
    drawings: BTreeMap<u64, Drawing>,
    profiles: HashMap<UserId, UserProfile>,
    activity: Vec<UserActivity>,
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory stand-in for the hosted backend.
#[derive(Clone, Default)]
pub struct InMemoryRemote {
    state: Arc<Mutex<State>>,
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, RemoteError> {
        self.state
            .lock()
            .map_err(|e| RemoteError::Operation(e.to_string()))
    }

    /// Register credentials and bind the session to the new user.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned; this helper is test-side only.
    #[must_use]
    pub fn register_user(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: UserId::new(Uuid::new_v4()),
            email: email.to_owned(),
        };
        let mut state = self.state.lock().expect("state mutex poisoned");
        state
            .credentials
            .insert(email.to_owned(), (user.id, password.to_owned()));
        state.current_user = Some(user.clone());
        user
    }

    /// Bind or clear the session identity directly.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned; this helper is test-side only.
    pub fn set_current_user(&self, user: Option<AuthUser>) {
        self.state.lock().expect("state mutex poisoned").current_user = user;
    }

    /// Seed catalog rows.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned; this helper is test-side only.
    pub fn seed_lessons(&self, lessons: impl IntoIterator<Item = Lesson>) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        for lesson in lessons {
            state.lessons.insert(lesson.id.value(), lesson);
        }
    }

    /// Seed catalog rows.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned; this helper is test-side only.
    pub fn seed_exercises(&self, exercises: impl IntoIterator<Item = Exercise>) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        for exercise in exercises {
            state.exercises.insert(exercise.id.value(), exercise);
        }
    }

    /// Seed catalog rows.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned; this helper is test-side only.
    pub fn seed_challenges(&self, challenges: impl IntoIterator<Item = Challenge>) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        for challenge in challenges {
            state.challenges.insert(challenge.id.value(), challenge);
        }
    }

    /// Seed activity entries.
    ///
    /// # Panics
    ///
    /// Panics if the state mutex is poisoned; this helper is test-side only.
    pub fn seed_activity(&self, entries: impl IntoIterator<Item = UserActivity>) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        state.activity.extend(entries);
    }
}

#[async_trait]
impl AuthClient for InMemoryRemote {
    async fn current_user(&self) -> Result<Option<AuthUser>, RemoteError> {
        Ok(self.lock()?.current_user.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        let mut state = self.lock()?;
        match state.credentials.get(email) {
            Some((id, stored)) if stored == password => {
                let user = AuthUser {
                    id: *id,
                    email: email.to_owned(),
                };
                state.current_user = Some(user.clone());
                Ok(user)
            }
            _ => Err(RemoteError::Operation("invalid login credentials".into())),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        let mut state = self.lock()?;
        if state.credentials.contains_key(email) {
            return Err(RemoteError::Operation("user already registered".into()));
        }
        let user = AuthUser {
            id: UserId::new(Uuid::new_v4()),
            email: email.to_owned(),
        };
        state
            .credentials
            .insert(email.to_owned(), (user.id, password.to_owned()));
        state.current_user = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        self.lock()?.current_user = None;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<(), RemoteError> {
        let mut state = self.lock()?;
        let email = state
            .current_user
            .as_ref()
            .map(|user| user.email.clone())
            .ok_or(RemoteError::NotAuthenticated)?;
        match state.credentials.get_mut(&email) {
            Some((_, stored)) => {
                *stored = new_password.to_owned();
                Ok(())
            }
            None => Err(RemoteError::NotFound),
        }
    }

    async fn delete_user(&self, user: UserId) -> Result<(), RemoteError> {
        let mut state = self.lock()?;
        state.credentials.retain(|_, (id, _)| *id != user);
        if state.current_user.as_ref().is_some_and(|u| u.id == user) {
            state.current_user = None;
        }
        Ok(())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRemote {
    async fn list_lessons(&self) -> Result<Vec<Lesson>, RemoteError> {
        let state = self.lock()?;
        let mut lessons: Vec<Lesson> = state.lessons.values().cloned().collect();
        lessons.sort_by_key(|lesson| lesson.order_number);
        Ok(lessons)
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Lesson, RemoteError> {
        self.lock()?
            .lessons
            .get(&id.value())
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn insert_lesson(&self, draft: &NewLesson) -> Result<Lesson, RemoteError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let lesson = Lesson {
            id: LessonId::new(state.allocate_id()),
            title: draft.title.clone(),
            description: draft.description.clone(),
            order_number: draft.order_number,
            created_at: now,
            updated_at: now,
        };
        state.lessons.insert(lesson.id.value(), lesson.clone());
        Ok(lesson)
    }
}

#[async_trait]
impl LessonNoteRepository for InMemoryRemote {
    async fn get_note(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<LessonNote>, RemoteError> {
        Ok(self.lock()?.notes.get(&(user, lesson)).cloned())
    }

    async fn insert_note(&self, note: &LessonNote) -> Result<LessonNote, RemoteError> {
        let mut state = self.lock()?;
        let mut stored = note.clone();
        stored.id = NoteId::new(state.allocate_id());
        state
            .notes
            .insert((stored.user_id, stored.lesson_id), stored.clone());
        Ok(stored)
    }

    async fn update_note(&self, note: &LessonNote) -> Result<LessonNote, RemoteError> {
        let mut state = self.lock()?;
        let key = (note.user_id, note.lesson_id);
        match state.notes.get_mut(&key) {
            Some(existing) => {
                existing.notes = note.notes.clone();
                existing.reflection = note.reflection.clone();
                existing.updated_at = note.updated_at;
                Ok(existing.clone())
            }
            None => Err(RemoteError::NotFound),
        }
    }

    async fn delete_note(&self, user: UserId, lesson: LessonId) -> Result<(), RemoteError> {
        self.lock()?.notes.remove(&(user, lesson));
        Ok(())
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        self.lock()?.notes.retain(|(owner, _), _| *owner != user);
        Ok(())
    }
}

#[async_trait]
impl ExerciseRepository for InMemoryRemote {
    async fn list_for_lesson(&self, lesson: LessonId) -> Result<Vec<Exercise>, RemoteError> {
        let state = self.lock()?;
        let mut exercises: Vec<Exercise> = state
            .exercises
            .values()
            .filter(|exercise| exercise.lesson_id == lesson)
            .cloned()
            .collect();
        exercises.sort_by_key(|exercise| exercise.order_number);
        Ok(exercises)
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Exercise, RemoteError> {
        self.lock()?
            .exercises
            .get(&id.value())
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn insert_exercise(&self, draft: &NewExercise) -> Result<Exercise, RemoteError> {
        let mut state = self.lock()?;
        let now = Utc::now();
        let exercise = Exercise {
            id: ExerciseId::new(state.allocate_id()),
            lesson_id: draft.lesson_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            order_number: draft.order_number,
            is_warmup_eligible: draft.is_warmup_eligible,
            category: draft.category.clone(),
            created_at: now,
            updated_at: now,
        };
        state.exercises.insert(exercise.id.value(), exercise.clone());
        Ok(exercise)
    }

    async fn categorized(&self) -> Result<Vec<CategorizedUnit>, RemoteError> {
        let state = self.lock()?;
        Ok(state
            .exercises
            .values()
            .map(CategorizedUnit::from)
            .collect())
    }

    async fn insert_submission(
        &self,
        user: UserId,
        draft: &NewSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<ExerciseSubmission, RemoteError> {
        let mut state = self.lock()?;
        let submission = ExerciseSubmission {
            id: SubmissionId::new(state.allocate_id()),
            user_id: user,
            exercise_id: draft.exercise_id(),
            image_url: draft.image_url().to_owned(),
            notes: draft.notes().to_owned(),
            self_rating: draft.self_rating(),
            created_at,
        };
        state.exercise_submissions.push(submission.clone());
        Ok(submission)
    }

    async fn get_progress(
        &self,
        user: UserId,
        exercise: ExerciseId,
    ) -> Result<Option<ExerciseProgress>, RemoteError> {
        Ok(self.lock()?.exercise_progress.get(&(user, exercise)).cloned())
    }

    async fn upsert_progress(&self, progress: &ExerciseProgress) -> Result<(), RemoteError> {
        self.lock()?
            .exercise_progress
            .insert((progress.user_id, progress.exercise_id), progress.clone());
        Ok(())
    }

    async fn completed_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ExerciseProgress>, RemoteError> {
        let state = self.lock()?;
        let mut rows: Vec<ExerciseProgress> = state
            .exercise_progress
            .values()
            .filter(|row| row.user_id == user && row.status == ProgressStatus::Completed)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(rows)
    }

    async fn completed_lesson_ids(&self, user: UserId) -> Result<Vec<LessonId>, RemoteError> {
        let state = self.lock()?;
        let mut lesson_ids: Vec<LessonId> = state
            .exercise_progress
            .values()
            .filter(|row| row.user_id == user && row.status == ProgressStatus::Completed)
            .filter_map(|row| state.exercises.get(&row.exercise_id.value()))
            .map(|exercise| exercise.lesson_id)
            .collect();
        lesson_ids.sort();
        lesson_ids.dedup();
        Ok(lesson_ids)
    }

    async fn warmup_candidates(
        &self,
        user: UserId,
    ) -> Result<Vec<WarmupCandidate>, RemoteError> {
        let state = self.lock()?;
        let mut candidates: Vec<WarmupCandidate> = state
            .exercise_progress
            .values()
            .filter(|row| row.user_id == user && row.status == ProgressStatus::Completed)
            .filter_map(|row| {
                state
                    .exercises
                    .get(&row.exercise_id.value())
                    .filter(|exercise| exercise.is_warmup_eligible)
                    .map(|exercise| WarmupCandidate {
                        progress: row.clone(),
                        exercise: exercise.clone(),
                    })
            })
            .collect();
        // never-used candidates sort ahead of recently-used ones
        candidates.sort_by_key(|candidate| {
            (
                candidate.progress.warmup_count,
                candidate.progress.last_used_as_warmup,
            )
        });
        Ok(candidates)
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        let mut state = self.lock()?;
        state.exercise_progress.retain(|(owner, _), _| *owner != user);
        state
            .exercise_submissions
            .retain(|submission| submission.user_id != user);
        Ok(())
    }
}

#[async_trait]
impl ChallengeRepository for InMemoryRemote {
    async fn list_challenges(&self) -> Result<Vec<Challenge>, RemoteError> {
        let state = self.lock()?;
        let mut challenges: Vec<Challenge> = state.challenges.values().cloned().collect();
        challenges.sort_by_key(|challenge| challenge.order_number);
        Ok(challenges)
    }

    async fn get_challenge(&self, id: ChallengeId) -> Result<Challenge, RemoteError> {
        self.lock()?
            .challenges
            .get(&id.value())
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn get_progress(
        &self,
        user: UserId,
        challenge: ChallengeId,
    ) -> Result<Option<ChallengeProgress>, RemoteError> {
        Ok(self
            .lock()?
            .challenge_progress
            .get(&(user, challenge))
            .cloned())
    }

    async fn insert_progress(
        &self,
        progress: &ChallengeProgress,
    ) -> Result<ChallengeProgress, RemoteError> {
        self.lock()?
            .challenge_progress
            .insert((progress.user_id, progress.challenge_id), progress.clone());
        Ok(progress.clone())
    }

    async fn upsert_progress(&self, progress: &ChallengeProgress) -> Result<(), RemoteError> {
        self.lock()?
            .challenge_progress
            .insert((progress.user_id, progress.challenge_id), progress.clone());
        Ok(())
    }

    async fn insert_submission(
        &self,
        user: UserId,
        draft: &NewChallengeSubmission,
        _created_at: DateTime<Utc>,
    ) -> Result<(), RemoteError> {
        self.lock()?
            .challenge_submissions
            .push(StoredChallengeSubmission {
                user_id: user,
                challenge_id: draft.challenge_id(),
                count: draft.count(),
            });
        Ok(())
    }

    async fn completed_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ChallengeProgress>, RemoteError> {
        let state = self.lock()?;
        Ok(state
            .challenge_progress
            .values()
            .filter(|row| row.user_id == user && row.status == ProgressStatus::Completed)
            .cloned()
            .collect())
    }

    async fn active_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<(ChallengeProgress, Challenge)>, RemoteError> {
        let state = self.lock()?;
        Ok(state
            .challenge_progress
            .values()
            .filter(|row| row.user_id == user && row.status == ProgressStatus::InProgress)
            .filter_map(|row| {
                state
                    .challenges
                    .get(&row.challenge_id.value())
                    .map(|challenge| (row.clone(), challenge.clone()))
            })
            .collect())
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        let mut state = self.lock()?;
        state.challenge_progress.retain(|(owner, _), _| *owner != user);
        state
            .challenge_submissions
            .retain(|submission| submission.user_id != user);
        Ok(())
    }
}

#[async_trait]
impl DrawingRepository for InMemoryRemote {
    async fn list_prompts(&self) -> Result<Vec<DrawingPrompt>, RemoteError> {
        let state = self.lock()?;
        let mut prompts: Vec<DrawingPrompt> = state.prompts.values().cloned().collect();
        prompts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(prompts)
    }

    async fn insert_prompt(
        &self,
        user: UserId,
        draft: &NewPrompt,
        created_at: DateTime<Utc>,
    ) -> Result<DrawingPrompt, RemoteError> {
        let mut state = self.lock()?;
        let prompt = DrawingPrompt {
            id: PromptId::new(state.allocate_id()),
            user_id: user,
            prompt_text: draft.prompt_text().to_owned(),
            category: draft.category().map(str::to_owned),
            created_at,
            updated_at: created_at,
        };
        state.prompts.insert(prompt.id.value(), prompt.clone());
        Ok(prompt)
    }

    async fn insert_drawing(
        &self,
        user: UserId,
        draft: &NewDrawing,
        created_at: DateTime<Utc>,
    ) -> Result<Drawing, RemoteError> {
        let mut state = self.lock()?;
        let drawing = Drawing {
            id: DrawingId::new(state.allocate_id()),
            user_id: user,
            image_url: Some(draft.image_url().to_owned()),
            time_spent_minutes: Some(draft.time_spent_minutes()),
            notes: Some(draft.notes().to_owned()),
            prompt_id: draft.prompt_id(),
            created_at,
            updated_at: created_at,
        };
        state.drawings.insert(drawing.id.value(), drawing.clone());
        Ok(drawing)
    }

    async fn drawings_for_user(&self, user: UserId) -> Result<Vec<UserDrawing>, RemoteError> {
        let state = self.lock()?;
        let mut drawings: Vec<UserDrawing> = state
            .drawings
            .values()
            .filter(|drawing| drawing.user_id == user)
            .map(|drawing| UserDrawing {
                drawing: drawing.clone(),
                prompt: drawing
                    .prompt_id
                    .and_then(|id| state.prompts.get(&id.value()).cloned()),
            })
            .collect();
        drawings.sort_by(|a, b| b.drawing.created_at.cmp(&a.drawing.created_at));
        Ok(drawings)
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        let mut state = self.lock()?;
        state.drawings.retain(|_, drawing| drawing.user_id != user);
        state.prompts.retain(|_, prompt| prompt.user_id != user);
        Ok(())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRemote {
    async fn get_profile(&self, user: UserId) -> Result<Option<UserProfile>, RemoteError> {
        Ok(self.lock()?.profiles.get(&user).cloned())
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<UserProfile, RemoteError> {
        self.lock()?.profiles.insert(profile.id, profile.clone());
        Ok(profile.clone())
    }

    async fn update_profile(
        &self,
        user: UserId,
        patch: &ProfilePatch,
        updated_at: DateTime<Utc>,
    ) -> Result<UserProfile, RemoteError> {
        let mut state = self.lock()?;
        match state.profiles.get_mut(&user) {
            Some(profile) => {
                if let Some(name) = &patch.name {
                    profile.name = name.clone();
                }
                if let Some(email) = &patch.email {
                    profile.email = email.clone();
                }
                profile.updated_at = updated_at;
                Ok(profile.clone())
            }
            None => Err(RemoteError::NotFound),
        }
    }

    async fn delete_profile(&self, user: UserId) -> Result<(), RemoteError> {
        self.lock()?.profiles.remove(&user);
        Ok(())
    }
}

#[async_trait]
impl ActivityRepository for InMemoryRemote {
    async fn recent_for_user(
        &self,
        user: UserId,
        limit: u32,
    ) -> Result<Vec<UserActivity>, RemoteError> {
        let mut entries = self.list_for_user(user).await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<UserActivity>, RemoteError> {
        let state = self.lock()?;
        Ok(state
            .activity
            .iter()
            .filter(|entry| entry.user_id == user)
            .cloned()
            .collect())
    }

    async fn delete_user_data(&self, user: UserId) -> Result<(), RemoteError> {
        self.lock()?.activity.retain(|entry| entry.user_id != user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::time::fixed_now;

    fn lesson(id: u64, order: u32) -> Lesson {
        Lesson {
            id: LessonId::new(id),
            title: format!("Lesson {id}"),
            description: String::new(),
            order_number: order,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn lessons_come_back_in_catalog_order() {
        let backend = InMemoryRemote::new();
        backend.seed_lessons([lesson(1, 2), lesson(2, 1)]);

        let lessons = backend.list_lessons().await.unwrap();
        assert_eq!(lessons[0].id, LessonId::new(2));
        assert_eq!(lessons[1].id, LessonId::new(1));
    }

    #[tokio::test]
    async fn missing_lesson_is_not_found() {
        let backend = InMemoryRemote::new();
        assert_eq!(
            backend.get_lesson(LessonId::new(9)).await,
            Err(RemoteError::NotFound)
        );
    }

    #[tokio::test]
    async fn sign_in_rejects_wrong_password() {
        let backend = InMemoryRemote::new();
        backend.register_user("a@example.com", "hunter2");
        backend.set_current_user(None);

        let err = backend.sign_in("a@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, RemoteError::Operation(_)));
        assert_eq!(backend.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn progress_upsert_round_trips() {
        let backend = InMemoryRemote::new();
        let user = backend.register_user("a@example.com", "pw");
        let progress =
            ExerciseProgress::completed(user.id, ExerciseId::new(3), fixed_now());

        ExerciseRepository::upsert_progress(&backend, &progress)
            .await
            .unwrap();
        let fetched = ExerciseRepository::get_progress(&backend, user.id, ExerciseId::new(3))
            .await
            .unwrap();
        assert_eq!(fetched, Some(progress));
    }
}
