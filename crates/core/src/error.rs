use thiserror::Error;

use crate::model::{
    ChallengeError, DrawingError, ExerciseError, ImageUrlError, LessonError, ProfileError,
    ProgressError, SubmissionError,
};

/// Umbrella over domain validation failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
    #[error(transparent)]
    Drawing(#[from] DrawingError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Image(#[from] ImageUrlError),
}
