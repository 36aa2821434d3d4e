use std::sync::Arc;

use easel_core::model::{Drawing, DrawingPrompt, NewDrawing, NewPrompt, UserDrawing};
use services::DrawingService;

use crate::result::{StoreResult, StoreState};

/// Free-drawing state: the user's drawings and the prompt catalog.
pub struct DrawingsStore {
    service: Arc<DrawingService>,
    state: StoreState,
    drawings: Vec<UserDrawing>,
    prompts: Vec<DrawingPrompt>,
}

impl DrawingsStore {
    #[must_use]
    pub fn new(service: Arc<DrawingService>) -> Self {
        Self {
            service,
            state: StoreState::default(),
            drawings: Vec::new(),
            prompts: Vec::new(),
        }
    }

    /// Fetch the user's drawings, newest first.
    pub async fn load_drawings(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.user_drawings().await {
            Ok(drawings) => {
                self.drawings = drawings;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Fetch the prompt catalog, newest first.
    pub async fn load_prompts(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.prompts().await {
            Ok(prompts) => {
                self.prompts = prompts;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Author a prompt and refresh the catalog.
    pub async fn create_prompt(&mut self, draft: NewPrompt) -> StoreResult<DrawingPrompt> {
        self.state.begin();
        let prompt = match self.service.create_prompt(draft).await {
            Ok(prompt) => prompt,
            Err(e) => return self.state.finish_err(e),
        };
        match self.service.prompts().await {
            Ok(prompts) => {
                self.prompts = prompts;
                self.state.finish_ok(prompt)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// A uniformly random prompt from the catalog, `None` when it is empty.
    pub async fn random_prompt(&mut self) -> StoreResult<Option<DrawingPrompt>> {
        self.state.begin();
        match self.service.random_prompt().await {
            Ok(prompt) => self.state.finish_ok(prompt),
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Record a drawing session and refresh the collection.
    pub async fn submit_drawing(&mut self, draft: NewDrawing) -> StoreResult<Drawing> {
        self.state.begin();
        let drawing = match self.service.submit_drawing(draft).await {
            Ok(drawing) => drawing,
            Err(e) => return self.state.finish_err(e),
        };
        match self.service.user_drawings().await {
            Ok(drawings) => {
                self.drawings = drawings;
                self.state.finish_ok(drawing)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    #[must_use]
    pub fn drawings(&self) -> &[UserDrawing] {
        &self.drawings
    }

    #[must_use]
    pub fn prompts(&self) -> &[DrawingPrompt] {
        &self.prompts
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
