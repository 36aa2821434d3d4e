mod challenge;
mod drawing;
mod exercise;
mod ids;
mod image;
mod lesson;
mod profile;
mod status;

pub use ids::{
    ActivityId, ChallengeId, DrawingId, ExerciseId, LessonId, NoteId, ParseIdError, PromptId,
    SubmissionId, UserId,
};
pub use status::ProgressStatus;

pub use challenge::{Challenge, ChallengeError, ChallengeProgress, NewChallengeSubmission};
pub use drawing::{Drawing, DrawingError, DrawingPrompt, NewDrawing, NewPrompt, UserDrawing};
pub use exercise::{
    Exercise, ExerciseError, ExerciseProgress, ExerciseSubmission, NewExercise, NewSubmission,
    ProgressError, SubmissionError, WarmupCandidate,
};
pub use image::{ImageUrl, ImageUrlError};
pub use lesson::{Lesson, LessonError, LessonNote, NewLesson};
pub use profile::{AuthUser, ProfileError, ProfilePatch, UserActivity, UserProfile};
