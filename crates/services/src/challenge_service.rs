use std::sync::Arc;

use tracing::debug;

use easel_core::model::{
    AuthUser, Challenge, ChallengeId, ChallengeProgress, NewChallengeSubmission,
};
use easel_core::Clock;
use remote::repository::{AuthClient, ChallengeRepository};

use crate::error::ChallengeServiceError;

/// Challenge catalog access and the per-user running counts.
#[derive(Clone)]
pub struct ChallengeService {
    clock: Clock,
    auth: Arc<dyn AuthClient>,
    challenges: Arc<dyn ChallengeRepository>,
}

impl ChallengeService {
    #[must_use]
    pub fn new(
        clock: Clock,
        auth: Arc<dyn AuthClient>,
        challenges: Arc<dyn ChallengeRepository>,
    ) -> Self {
        Self {
            clock,
            auth,
            challenges,
        }
    }

    async fn current_user(&self) -> Result<AuthUser, ChallengeServiceError> {
        self.auth
            .current_user()
            .await?
            .ok_or(ChallengeServiceError::NotAuthenticated)
    }

    /// Every challenge in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeServiceError` on backend failures.
    pub async fn list_challenges(&self) -> Result<Vec<Challenge>, ChallengeServiceError> {
        Ok(self.challenges.list_challenges().await?)
    }

    /// One challenge by id.
    ///
    /// # Errors
    ///
    /// Returns `ChallengeServiceError` if the challenge does not exist.
    pub async fn get_challenge(&self, id: ChallengeId) -> Result<Challenge, ChallengeServiceError> {
        Ok(self.challenges.get_challenge(id).await?)
    }

    /// The signed-in user's progress row for a challenge, creating a
    /// `not_started` row when none exists yet.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn progress(
        &self,
        challenge: ChallengeId,
    ) -> Result<ChallengeProgress, ChallengeServiceError> {
        let user = self.current_user().await?;
        match self.challenges.get_progress(user.id, challenge).await? {
            Some(existing) => Ok(existing),
            None => {
                let fresh = ChallengeProgress::not_started(user.id, challenge);
                Ok(self.challenges.insert_progress(&fresh).await?)
            }
        }
    }

    /// Record a submission toward a challenge and advance the signed-in
    /// user's count, transitioning status at the target threshold.
    ///
    /// The read-modify-write is not atomic; two concurrent submissions can
    /// lose one increment.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in, or `NotFound`
    /// for an unknown challenge.
    pub async fn submit_progress(
        &self,
        draft: NewChallengeSubmission,
    ) -> Result<ChallengeProgress, ChallengeServiceError> {
        let user = self.current_user().await?;
        let now = self.clock.now();
        let challenge_id = draft.challenge_id();

        self.challenges
            .insert_submission(user.id, &draft, now)
            .await?;
        let challenge = self.challenges.get_challenge(challenge_id).await?;
        let current = match self.challenges.get_progress(user.id, challenge_id).await? {
            Some(existing) => existing,
            None => ChallengeProgress::not_started(user.id, challenge_id),
        };

        let advanced = current.advance(draft.count(), challenge.target_count, now);
        self.challenges.upsert_progress(&advanced).await?;
        debug!(
            "challenge {} now at {}/{}",
            challenge_id, advanced.current_count, challenge.target_count
        );
        Ok(advanced)
    }

    /// Challenges the signed-in user has in progress, with their rows.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn active(
        &self,
    ) -> Result<Vec<(ChallengeProgress, Challenge)>, ChallengeServiceError> {
        let user = self.current_user().await?;
        Ok(self.challenges.active_for_user(user.id).await?)
    }

    /// The signed-in user's completed challenge rows.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn completed(&self) -> Result<Vec<ChallengeProgress>, ChallengeServiceError> {
        let user = self.current_user().await?;
        Ok(self.challenges.completed_for_user(user.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::model::ProgressStatus;
    use easel_core::time::{fixed_clock, fixed_now};
    use remote::{InMemoryRemote, Remote};

    fn seed_challenge(backend: &InMemoryRemote, id: u64, target: u32) {
        backend.seed_challenges([Challenge {
            id: ChallengeId::new(id),
            title: format!("challenge {id}"),
            description: String::new(),
            target_count: target,
            order_number: id as u32,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }]);
    }

    fn service(backend: InMemoryRemote) -> ChallengeService {
        let remote = Remote::from_memory(backend);
        ChallengeService::new(fixed_clock(), remote.auth, remote.challenges)
    }

    fn signed_in(backend: &InMemoryRemote) {
        let user = backend.register_user("pat@example.com", "pw");
        backend.set_current_user(Some(user));
    }

    fn submission(challenge: u64, count: u32) -> NewChallengeSubmission {
        NewChallengeSubmission::new(
            ChallengeId::new(challenge),
            count,
            "https://img.example/c.png",
            "",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn progress_is_created_on_first_access() {
        let backend = InMemoryRemote::new();
        seed_challenge(&backend, 1, 50);
        signed_in(&backend);
        let service = service(backend);

        let progress = service.progress(ChallengeId::new(1)).await.unwrap();
        assert_eq!(progress.status, ProgressStatus::NotStarted);
        assert_eq!(progress.current_count, 0);

        // A second access returns the stored row rather than a new one.
        let again = service.progress(ChallengeId::new(1)).await.unwrap();
        assert_eq!(again, progress);
    }

    #[tokio::test]
    async fn counts_accumulate_and_complete_at_the_target() {
        let backend = InMemoryRemote::new();
        seed_challenge(&backend, 1, 10);
        signed_in(&backend);
        let service = service(backend);

        let mid = service.submit_progress(submission(1, 4)).await.unwrap();
        assert_eq!(mid.status, ProgressStatus::InProgress);
        assert_eq!(mid.started_at, Some(fixed_now()));
        assert_eq!(mid.completed_at, None);

        let done = service.submit_progress(submission(1, 6)).await.unwrap();
        assert_eq!(done.status, ProgressStatus::Completed);
        assert_eq!(done.current_count, 10);
        assert_eq!(done.completed_at, Some(fixed_now()));

        let active = service.active().await.unwrap();
        assert!(active.is_empty());
        assert_eq!(service.completed().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overshooting_the_target_still_counts() {
        let backend = InMemoryRemote::new();
        seed_challenge(&backend, 1, 5);
        signed_in(&backend);
        let service = service(backend);

        let done = service.submit_progress(submission(1, 8)).await.unwrap();
        assert_eq!(done.status, ProgressStatus::Completed);
        assert_eq!(done.current_count, 8);

        let more = service.submit_progress(submission(1, 2)).await.unwrap();
        assert_eq!(more.current_count, 10);
        assert_eq!(more.status, ProgressStatus::Completed);
        assert_eq!(more.completed_at, done.completed_at);
    }

    #[tokio::test]
    async fn unknown_challenge_is_not_found() {
        let backend = InMemoryRemote::new();
        signed_in(&backend);
        let service = service(backend);
        let result = service.submit_progress(submission(42, 1)).await;
        assert!(matches!(
            result,
            Err(ChallengeServiceError::Remote(remote::RemoteError::NotFound))
        ));
    }
}
