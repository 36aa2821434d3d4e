use std::sync::Arc;

use easel_core::model::AuthUser;
use services::AuthService;

use crate::result::{StoreResult, StoreState};

/// Session state: who is signed in, if anyone.
pub struct AuthStore {
    service: Arc<AuthService>,
    state: StoreState,
    current_user: Option<AuthUser>,
}

impl AuthStore {
    #[must_use]
    pub fn new(service: Arc<AuthService>) -> Self {
        Self {
            service,
            state: StoreState::default(),
            current_user: None,
        }
    }

    /// Re-read the session from the backend.
    pub async fn refresh(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.current_user().await {
            Ok(user) => {
                self.current_user = user;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Sign in and keep the session.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> StoreResult<AuthUser> {
        self.state.begin();
        match self.service.sign_in(email, password).await {
            Ok(user) => {
                self.current_user = Some(user.clone());
                self.state.finish_ok(user)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Register a new account and keep the session.
    pub async fn sign_up(&mut self, email: &str, password: &str) -> StoreResult<AuthUser> {
        self.state.begin();
        match self.service.sign_up(email, password).await {
            Ok(user) => {
                self.current_user = Some(user.clone());
                self.state.finish_ok(user)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// End the session.
    pub async fn sign_out(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.sign_out().await {
            Ok(()) => {
                self.current_user = None;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&AuthUser> {
        self.current_user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
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
