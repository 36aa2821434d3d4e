use std::sync::Arc;

use rand::rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use easel_core::model::{AuthUser, Drawing, DrawingPrompt, NewDrawing, NewPrompt, UserDrawing};
use easel_core::Clock;
use remote::repository::{AuthClient, DrawingRepository};

use crate::error::DrawingServiceError;

/// Free-drawing prompts and session records.
#[derive(Clone)]
pub struct DrawingService {
    clock: Clock,
    auth: Arc<dyn AuthClient>,
    drawings: Arc<dyn DrawingRepository>,
}

impl DrawingService {
    #[must_use]
    pub fn new(clock: Clock, auth: Arc<dyn AuthClient>, drawings: Arc<dyn DrawingRepository>) -> Self {
        Self {
            clock,
            auth,
            drawings,
        }
    }

    async fn current_user(&self) -> Result<AuthUser, DrawingServiceError> {
        self.auth
            .current_user()
            .await?
            .ok_or(DrawingServiceError::NotAuthenticated)
    }

    /// Every prompt, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DrawingServiceError` on backend failures.
    pub async fn prompts(&self) -> Result<Vec<DrawingPrompt>, DrawingServiceError> {
        Ok(self.drawings.list_prompts().await?)
    }

    /// Store a prompt authored by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn create_prompt(
        &self,
        draft: NewPrompt,
    ) -> Result<DrawingPrompt, DrawingServiceError> {
        let user = self.current_user().await?;
        let prompt = self
            .drawings
            .insert_prompt(user.id, &draft, self.clock.now())
            .await?;
        debug!("created prompt {}", prompt.id);
        Ok(prompt)
    }

    /// A uniformly random prompt, or `None` when there are no prompts.
    ///
    /// # Errors
    ///
    /// Returns `DrawingServiceError` on backend failures.
    pub async fn random_prompt(&self) -> Result<Option<DrawingPrompt>, DrawingServiceError> {
        let prompts = self.drawings.list_prompts().await?;
        Ok(prompts.choose(&mut rng()).cloned())
    }

    /// Record a free-drawing session for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn submit_drawing(&self, draft: NewDrawing) -> Result<Drawing, DrawingServiceError> {
        let user = self.current_user().await?;
        let drawing = self
            .drawings
            .insert_drawing(user.id, &draft, self.clock.now())
            .await?;
        debug!("recorded drawing {}", drawing.id);
        Ok(drawing)
    }

    /// The signed-in user's drawings, newest first, each joined with the
    /// prompt it answered when there was one.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn user_drawings(&self) -> Result<Vec<UserDrawing>, DrawingServiceError> {
        let user = self.current_user().await?;
        Ok(self.drawings.drawings_for_user(user.id).await?)
    }
}
