use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ChallengeId, UserId};
use crate::model::image::{ImageUrl, ImageUrlError};
use crate::model::status::ProgressStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChallengeError {
    #[error("submission count must be > 0")]
    ZeroCount,

    #[error(transparent)]
    Image(#[from] ImageUrlError),
}

/// A long-running drawing challenge with a target completion count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub title: String,
    pub description: String,
    pub target_count: u32,
    pub order_number: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One user's running count against one challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub user_id: UserId,
    pub challenge_id: ChallengeId,
    pub current_count: u32,
    pub status: ProgressStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChallengeProgress {
    /// A fresh row for a user who has not started the challenge.
    #[must_use]
    pub fn not_started(user_id: UserId, challenge_id: ChallengeId) -> Self {
        Self {
            user_id,
            challenge_id,
            current_count: 0,
            status: ProgressStatus::NotStarted,
            started_at: None,
            completed_at: None,
        }
    }

    /// Apply a submission of `count` drawings toward `target_count`.
    ///
    /// Reaching the target transitions to `Completed` and stamps
    /// `completed_at`; the first submission on an untouched row transitions to
    /// `InProgress` and stamps `started_at`. Already-completed rows keep
    /// accumulating count without changing status.
    #[must_use]
    pub fn advance(&self, count: u32, target_count: u32, now: DateTime<Utc>) -> Self {
        let new_count = self.current_count.saturating_add(count);
        let mut next = self.clone();
        next.current_count = new_count;
        next.started_at = self.started_at.or(Some(now));

        if self.status != ProgressStatus::Completed {
            if new_count >= target_count {
                next.status = ProgressStatus::Completed;
                next.completed_at = Some(now);
            } else if self.status == ProgressStatus::NotStarted {
                next.status = ProgressStatus::InProgress;
            }
        }
        next
    }

    /// Fraction of the target reached, clamped to 1.0.
    #[must_use]
    pub fn completion_ratio(&self, target_count: u32) -> f64 {
        if target_count == 0 {
            return 0.0;
        }
        (f64::from(self.current_count) / f64::from(target_count)).min(1.0)
    }
}

/// Validated draft for a challenge submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChallengeSubmission {
    challenge_id: ChallengeId,
    count: u32,
    image_url: ImageUrl,
    notes: String,
}

impl NewChallengeSubmission {
    /// Build a validated challenge submission.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeError::ZeroCount` for a zero count and
    /// `ChallengeError::Image` for a malformed image URL.
    pub fn new(
        challenge_id: ChallengeId,
        count: u32,
        image_url: impl AsRef<str>,
        notes: impl Into<String>,
    ) -> Result<Self, ChallengeError> {
        if count == 0 {
            return Err(ChallengeError::ZeroCount);
        }
        Ok(Self {
            challenge_id,
            count,
            image_url: ImageUrl::parse(image_url)?,
            notes: notes.into(),
        })
    }

    #[must_use]
    pub fn challenge_id(&self) -> ChallengeId {
        self.challenge_id
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        self.image_url.as_str()
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use uuid::Uuid;

    fn row() -> ChallengeProgress {
        ChallengeProgress::not_started(UserId::new(Uuid::from_u128(1)), ChallengeId::new(9))
    }

    #[test]
    fn first_submission_below_target_starts_progress() {
        let next = row().advance(3, 10, fixed_now());
        assert_eq!(next.current_count, 3);
        assert_eq!(next.status, ProgressStatus::InProgress);
        assert_eq!(next.started_at, Some(fixed_now()));
        assert_eq!(next.completed_at, None);
    }

    #[test]
    fn crossing_target_completes_and_stamps_timestamp() {
        let mid = row().advance(6, 10, fixed_now());
        let done = mid.advance(4, 10, fixed_now());
        assert_eq!(done.current_count, 10);
        assert_eq!(done.status, ProgressStatus::Completed);
        assert_eq!(done.completed_at, Some(fixed_now()));
    }

    #[test]
    fn in_progress_submission_keeps_status_below_target() {
        let mid = row().advance(2, 10, fixed_now());
        let still = mid.advance(3, 10, fixed_now());
        assert_eq!(still.status, ProgressStatus::InProgress);
        assert_eq!(still.current_count, 5);
    }

    #[test]
    fn completed_row_keeps_counting_without_status_change() {
        let done = row().advance(10, 10, fixed_now());
        let later = chrono::DateTime::from_timestamp(1_800_000_000, 0).unwrap();
        let extra = done.advance(1, 10, later);
        assert_eq!(extra.status, ProgressStatus::Completed);
        assert_eq!(extra.completed_at, done.completed_at);
        assert_eq!(extra.current_count, 11);
    }

    #[test]
    fn completion_ratio_clamps_to_one() {
        let done = row().advance(15, 10, fixed_now());
        assert!((done.completion_ratio(10) - 1.0).abs() < f64::EPSILON);
        assert!((row().completion_ratio(0)).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_count_submission_is_rejected() {
        let result =
            NewChallengeSubmission::new(ChallengeId::new(1), 0, "https://x.test/a.png", "");
        assert_eq!(result, Err(ChallengeError::ZeroCount));
    }
}
