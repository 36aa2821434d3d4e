use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ExerciseId, LessonId, SubmissionId, UserId};
use crate::model::image::{ImageUrl, ImageUrlError};
use crate::model::status::ProgressStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("exercise title cannot be empty")]
    EmptyTitle,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error(transparent)]
    Image(#[from] ImageUrlError),

    #[error("self rating must be between 1 and 5, got {provided}")]
    InvalidRating { provided: u8 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("completed progress must carry a completion timestamp")]
    MissingCompletedAt,

    #[error("only completed progress may carry a completion timestamp")]
    UnexpectedCompletedAt,
}

/// A single exercise inside a lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub lesson_id: LessonId,
    pub title: String,
    pub description: String,
    pub order_number: u32,
    pub is_warmup_eligible: bool,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft for inserting a new exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewExercise {
    pub lesson_id: LessonId,
    pub title: String,
    pub description: String,
    pub order_number: u32,
    pub is_warmup_eligible: bool,
    pub category: Option<String>,
}

impl NewExercise {
    /// Build a validated exercise draft.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseError::EmptyTitle` when the title is blank.
    pub fn new(
        lesson_id: LessonId,
        title: impl Into<String>,
        description: impl Into<String>,
        order_number: u32,
    ) -> Result<Self, ExerciseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ExerciseError::EmptyTitle);
        }
        Ok(Self {
            lesson_id,
            title,
            description: description.into(),
            order_number,
            is_warmup_eligible: false,
            category: None,
        })
    }

    #[must_use]
    pub fn warmup_eligible(mut self, eligible: bool) -> Self {
        self.is_warmup_eligible = eligible;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// One user's progress row against one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub user_id: UserId,
    pub exercise_id: ExerciseId,
    pub status: ProgressStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub warmup_count: u32,
    pub last_used_as_warmup: Option<DateTime<Utc>>,
}

impl ExerciseProgress {
    /// A completed progress row stamped at `completed_at`.
    #[must_use]
    pub fn completed(user_id: UserId, exercise_id: ExerciseId, completed_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            exercise_id,
            status: ProgressStatus::Completed,
            completed_at: Some(completed_at),
            warmup_count: 0,
            last_used_as_warmup: None,
        }
    }

    /// Check the status/completed_at pairing invariant.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when the timestamp and status disagree.
    pub fn validate(&self) -> Result<(), ProgressError> {
        match (self.status, self.completed_at) {
            (ProgressStatus::Completed, None) => Err(ProgressError::MissingCompletedAt),
            (ProgressStatus::NotStarted | ProgressStatus::InProgress, Some(_)) => {
                Err(ProgressError::UnexpectedCompletedAt)
            }
            _ => Ok(()),
        }
    }
}

/// One submitted attempt at an exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSubmission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub exercise_id: ExerciseId,
    pub image_url: String,
    pub notes: String,
    pub self_rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

/// Validated draft for submitting an exercise attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    exercise_id: ExerciseId,
    image_url: ImageUrl,
    notes: String,
    self_rating: Option<u8>,
}

impl NewSubmission {
    /// Build a validated submission draft.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError::Image` for a malformed image URL and
    /// `SubmissionError::InvalidRating` for a rating outside 1..=5.
    pub fn new(
        exercise_id: ExerciseId,
        image_url: impl AsRef<str>,
        notes: impl Into<String>,
        self_rating: Option<u8>,
    ) -> Result<Self, SubmissionError> {
        if let Some(rating) = self_rating {
            if !(1..=5).contains(&rating) {
                return Err(SubmissionError::InvalidRating { provided: rating });
            }
        }
        Ok(Self {
            exercise_id,
            image_url: ImageUrl::parse(image_url)?,
            notes: notes.into(),
            self_rating,
        })
    }

    #[must_use]
    pub fn exercise_id(&self) -> ExerciseId {
        self.exercise_id
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        self.image_url.as_str()
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn self_rating(&self) -> Option<u8> {
        self.self_rating
    }
}

/// A completed, warmup-eligible exercise offered for reuse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmupCandidate {
    pub progress: ExerciseProgress,
    pub exercise: Exercise,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use uuid::Uuid;

    fn user() -> UserId {
        UserId::new(Uuid::from_u128(7))
    }

    #[test]
    fn completed_progress_satisfies_invariant() {
        let progress = ExerciseProgress::completed(user(), ExerciseId::new(1), fixed_now());
        assert!(progress.validate().is_ok());
        assert!(progress.status.is_completed());
    }

    #[test]
    fn completed_without_timestamp_is_invalid() {
        let mut progress = ExerciseProgress::completed(user(), ExerciseId::new(1), fixed_now());
        progress.completed_at = None;
        assert_eq!(progress.validate(), Err(ProgressError::MissingCompletedAt));
    }

    #[test]
    fn pending_progress_rejects_timestamp() {
        let mut progress = ExerciseProgress::completed(user(), ExerciseId::new(1), fixed_now());
        progress.status = ProgressStatus::InProgress;
        assert_eq!(progress.validate(), Err(ProgressError::UnexpectedCompletedAt));
    }

    #[test]
    fn submission_rejects_out_of_range_rating() {
        let result = NewSubmission::new(
            ExerciseId::new(1),
            "https://cdn.example.com/a.png",
            "",
            Some(6),
        );
        assert_eq!(result, Err(SubmissionError::InvalidRating { provided: 6 }));
    }

    #[test]
    fn submission_rejects_bad_url() {
        let result = NewSubmission::new(ExerciseId::new(1), "nope", "", None);
        assert!(matches!(result, Err(SubmissionError::Image(_))));
    }
}
