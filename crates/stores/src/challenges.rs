use std::sync::Arc;

use easel_core::model::{Challenge, ChallengeId, ChallengeProgress, NewChallengeSubmission};
use services::ChallengeService;

use crate::result::{StoreResult, StoreState};

/// Challenge catalog state plus the user's running counts.
pub struct ChallengesStore {
    service: Arc<ChallengeService>,
    state: StoreState,
    challenges: Vec<Challenge>,
    current: Option<Challenge>,
    current_progress: Option<ChallengeProgress>,
    active: Vec<(ChallengeProgress, Challenge)>,
}

impl ChallengesStore {
    #[must_use]
    pub fn new(service: Arc<ChallengeService>) -> Self {
        Self {
            service,
            state: StoreState::default(),
            challenges: Vec::new(),
            current: None,
            current_progress: None,
            active: Vec::new(),
        }
    }

    /// Fetch the challenge catalog.
    pub async fn load_challenges(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.list_challenges().await {
            Ok(challenges) => {
                self.challenges = challenges;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Open one challenge together with the user's progress row, creating a
    /// fresh row on first access.
    pub async fn open_challenge(&mut self, id: ChallengeId) -> StoreResult<()> {
        self.state.begin();
        let challenge = match self.service.get_challenge(id).await {
            Ok(challenge) => challenge,
            Err(e) => return self.state.finish_err(e),
        };
        match self.service.progress(id).await {
            Ok(progress) => {
                self.current = Some(challenge);
                self.current_progress = Some(progress);
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Fetch the user's in-progress challenges.
    pub async fn load_active(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.active().await {
            Ok(active) => {
                self.active = active;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Submit work toward a challenge and keep the updated progress row.
    pub async fn submit_progress(
        &mut self,
        draft: NewChallengeSubmission,
    ) -> StoreResult<ChallengeProgress> {
        self.state.begin();
        match self.service.submit_progress(draft).await {
            Ok(progress) => {
                if self
                    .current
                    .as_ref()
                    .is_some_and(|c| c.id == progress.challenge_id)
                {
                    self.current_progress = Some(progress.clone());
                }
                self.state.finish_ok(progress)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    #[must_use]
    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    #[must_use]
    pub fn current_challenge(&self) -> Option<&Challenge> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn current_progress(&self) -> Option<&ChallengeProgress> {
        self.current_progress.as_ref()
    }

    #[must_use]
    pub fn active(&self) -> &[(ChallengeProgress, Challenge)] {
        &self.active
    }

    /// Active challenges ordered by how close each is to its target, closest
    /// first.
    #[must_use]
    pub fn active_by_completion_ratio(&self) -> Vec<&(ChallengeProgress, Challenge)> {
        let mut ordered: Vec<&(ChallengeProgress, Challenge)> = self.active.iter().collect();
        ordered.sort_by(|a, b| {
            let ratio_a = a.0.completion_ratio(a.1.target_count);
            let ratio_b = b.0.completion_ratio(b.1.target_count);
            ratio_b
                .partial_cmp(&ratio_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ordered
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
