use std::sync::Arc;

use easel_core::model::{Exercise, Lesson, LessonId, LessonNote, NewLesson};
use services::LessonService;

use crate::result::{StoreResult, StoreState};

/// Lesson catalog state plus the note for the opened lesson.
pub struct LessonsStore {
    service: Arc<LessonService>,
    state: StoreState,
    lessons: Vec<Lesson>,
    current: Option<Lesson>,
    current_exercises: Vec<Exercise>,
    current_note: Option<LessonNote>,
}

impl LessonsStore {
    #[must_use]
    pub fn new(service: Arc<LessonService>) -> Self {
        Self {
            service,
            state: StoreState::default(),
            lessons: Vec::new(),
            current: None,
            current_exercises: Vec::new(),
            current_note: None,
        }
    }

    /// Fetch the lesson catalog.
    pub async fn load_lessons(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.list_lessons().await {
            Ok(lessons) => {
                self.lessons = lessons;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Open one lesson: its row, its exercises, and the user's note for it.
    pub async fn open_lesson(&mut self, id: LessonId) -> StoreResult<()> {
        self.state.begin();
        let detail = self.service.get_lesson(id).await;
        let (lesson, exercises) = match detail {
            Ok(pair) => pair,
            Err(e) => return self.state.finish_err(e),
        };
        match self.service.lesson_notes(id).await {
            Ok(note) => {
                self.current = Some(lesson);
                self.current_exercises = exercises;
                self.current_note = note;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Add a lesson and keep the catalog ordered by `order_number`.
    pub async fn add_lesson(&mut self, draft: NewLesson) -> StoreResult<Lesson> {
        self.state.begin();
        match self.service.add_lesson(draft).await {
            Ok(lesson) => {
                self.lessons.push(lesson.clone());
                self.lessons.sort_by_key(|l| l.order_number);
                self.state.finish_ok(lesson)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Save the note for the opened lesson.
    pub async fn save_notes(&mut self, notes: &str, reflection: &str) -> StoreResult<LessonNote> {
        self.state.begin();
        let Some(lesson) = self.current.as_ref().map(|l| l.id) else {
            return self.state.finish_err("no lesson is open");
        };
        match self.service.save_lesson_notes(lesson, notes, reflection).await {
            Ok(note) => {
                self.current_note = Some(note.clone());
                self.state.finish_ok(note)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Delete the note for the opened lesson.
    pub async fn delete_notes(&mut self) -> StoreResult<()> {
        self.state.begin();
        let Some(lesson) = self.current.as_ref().map(|l| l.id) else {
            return self.state.finish_err("no lesson is open");
        };
        match self.service.delete_lesson_notes(lesson).await {
            Ok(()) => {
                self.current_note = None;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn current_exercises(&self) -> &[Exercise] {
        &self.current_exercises
    }

    #[must_use]
    pub fn current_note(&self) -> Option<&LessonNote> {
        self.current_note.as_ref()
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.state.busy()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error()
    }
}
