use std::sync::Arc;

use tracing::debug;

use easel_core::model::{
    AuthUser, Exercise, Lesson, LessonId, LessonNote, NewLesson, NoteId,
};
use easel_core::Clock;
use remote::repository::{AuthClient, ExerciseRepository, LessonNoteRepository, LessonRepository};

use crate::error::LessonServiceError;

/// Lesson catalog access plus the per-user lesson notes.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    auth: Arc<dyn AuthClient>,
    lessons: Arc<dyn LessonRepository>,
    exercises: Arc<dyn ExerciseRepository>,
    notes: Arc<dyn LessonNoteRepository>,
}

impl LessonService {
    #[must_use]
    pub fn new(
        clock: Clock,
        auth: Arc<dyn AuthClient>,
        lessons: Arc<dyn LessonRepository>,
        exercises: Arc<dyn ExerciseRepository>,
        notes: Arc<dyn LessonNoteRepository>,
    ) -> Self {
        Self {
            clock,
            auth,
            lessons,
            exercises,
            notes,
        }
    }

    async fn current_user(&self) -> Result<AuthUser, LessonServiceError> {
        self.auth
            .current_user()
            .await?
            .ok_or(LessonServiceError::NotAuthenticated)
    }

    /// Every lesson in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError` on backend failures.
    pub async fn list_lessons(&self) -> Result<Vec<Lesson>, LessonServiceError> {
        Ok(self.lessons.list_lessons().await?)
    }

    /// One lesson together with its exercises in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError` if the lesson does not exist.
    pub async fn get_lesson(
        &self,
        id: LessonId,
    ) -> Result<(Lesson, Vec<Exercise>), LessonServiceError> {
        let lesson = self.lessons.get_lesson(id).await?;
        let exercises = self.exercises.list_for_lesson(id).await?;
        Ok((lesson, exercises))
    }

    /// Add a lesson to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError` on backend failures.
    pub async fn add_lesson(&self, draft: NewLesson) -> Result<Lesson, LessonServiceError> {
        let lesson = self.lessons.insert_lesson(&draft).await?;
        debug!("added lesson {} ({})", lesson.id, lesson.title);
        Ok(lesson)
    }

    /// The signed-in user's note for a lesson, if any.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn lesson_notes(
        &self,
        lesson: LessonId,
    ) -> Result<Option<LessonNote>, LessonServiceError> {
        let user = self.current_user().await?;
        Ok(self.notes.get_note(user.id, lesson).await?)
    }

    /// Save the signed-in user's note for a lesson, updating the existing
    /// row when one exists and inserting otherwise.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn save_lesson_notes(
        &self,
        lesson: LessonId,
        notes: &str,
        reflection: &str,
    ) -> Result<LessonNote, LessonServiceError> {
        let user = self.current_user().await?;
        let now = self.clock.now();
        let saved = match self.notes.get_note(user.id, lesson).await? {
            Some(mut existing) => {
                existing.notes = notes.to_owned();
                existing.reflection = reflection.to_owned();
                existing.updated_at = now;
                self.notes.update_note(&existing).await?
            }
            None => {
                let fresh = LessonNote {
                    id: NoteId::new(0),
                    user_id: user.id,
                    lesson_id: lesson,
                    notes: notes.to_owned(),
                    reflection: reflection.to_owned(),
                    created_at: now,
                    updated_at: now,
                };
                self.notes.insert_note(&fresh).await?
            }
        };
        debug!("saved notes for lesson {lesson}");
        Ok(saved)
    }

    /// Delete the signed-in user's note for a lesson. Deleting a note that
    /// does not exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn delete_lesson_notes(&self, lesson: LessonId) -> Result<(), LessonServiceError> {
        let user = self.current_user().await?;
        self.notes.delete_note(user.id, lesson).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::time::fixed_clock;
    use remote::{InMemoryRemote, Remote};

    fn service(backend: InMemoryRemote) -> LessonService {
        let remote = Remote::from_memory(backend);
        LessonService::new(
            fixed_clock(),
            remote.auth,
            remote.lessons,
            remote.exercises,
            remote.notes,
        )
    }

    #[tokio::test]
    async fn note_operations_require_a_session() {
        let backend = InMemoryRemote::new();
        let service = service(backend);
        let result = service.lesson_notes(LessonId::new(1)).await;
        assert!(matches!(result, Err(LessonServiceError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn save_inserts_then_updates_in_place() {
        let backend = InMemoryRemote::new();
        let user = backend.register_user("pat@example.com", "pw");
        backend.set_current_user(Some(user));
        let service = service(backend);

        let lesson = LessonId::new(7);
        let first = service
            .save_lesson_notes(lesson, "gesture warmups", "")
            .await
            .unwrap();
        let second = service
            .save_lesson_notes(lesson, "gesture warmups", "felt looser today")
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.reflection, "felt looser today");
        let stored = service.lesson_notes(lesson).await.unwrap().unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn deleting_a_missing_note_is_fine() {
        let backend = InMemoryRemote::new();
        let user = backend.register_user("pat@example.com", "pw");
        backend.set_current_user(Some(user));
        let service = service(backend);
        service.delete_lesson_notes(LessonId::new(1)).await.unwrap();
    }
}
