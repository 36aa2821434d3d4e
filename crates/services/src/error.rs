//! Shared error types for the services crate.

use thiserror::Error;

use easel_core::model::{
    ChallengeError, DrawingError, ExerciseError, LessonError, ProfileError, SubmissionError,
};
use remote::RemoteError;

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `ExerciseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExerciseServiceError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Exercise(#[from] ExerciseError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `ChallengeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChallengeServiceError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Challenge(#[from] ChallengeError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `DrawingService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DrawingServiceError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error(transparent)]
    Drawing(#[from] DrawingError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `AccountService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountServiceError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error("current password is incorrect")]
    WrongPassword,
    #[error("could not serialize exported data: {0}")]
    Export(#[from] serde_json::Error),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthServiceError {
    #[error("email cannot be empty")]
    EmptyEmail,
    #[error("password cannot be empty")]
    EmptyPassword,
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
