use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, NoteId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,
}

/// A drawing lesson as stored by the backend, ordered by `order_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub description: String,
    pub order_number: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft for inserting a new lesson.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLesson {
    pub title: String,
    pub description: String,
    pub order_number: u32,
}

impl NewLesson {
    /// Build a validated lesson draft.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` when the title is blank.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        order_number: u32,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        Ok(Self {
            title,
            description: description.into(),
            order_number,
        })
    }
}

/// Per-user notes and reflection attached to one lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonNote {
    pub id: NoteId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub notes: String,
    pub reflection: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_lesson_rejects_blank_title() {
        assert_eq!(
            NewLesson::new("  ", "desc", 1),
            Err(LessonError::EmptyTitle)
        );
    }

    #[test]
    fn new_lesson_keeps_fields() {
        let draft = NewLesson::new("Gesture basics", "Lines of action", 3).unwrap();
        assert_eq!(draft.title, "Gesture basics");
        assert_eq!(draft.order_number, 3);
    }
}
