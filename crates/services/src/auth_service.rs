use std::sync::Arc;

use tracing::debug;

use easel_core::model::AuthUser;
use remote::repository::AuthClient;

use crate::error::AuthServiceError;

/// Sign-in, sign-up, and session lookup against the auth backend.
#[derive(Clone)]
pub struct AuthService {
    auth: Arc<dyn AuthClient>,
}

impl AuthService {
    #[must_use]
    pub fn new(auth: Arc<dyn AuthClient>) -> Self {
        Self { auth }
    }

    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthServiceError` on backend failures.
    pub async fn current_user(&self) -> Result<Option<AuthUser>, AuthServiceError> {
        Ok(self.auth.current_user().await?)
    }

    /// Sign in with an email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthServiceError` for blank credentials or rejected sign-ins.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthServiceError> {
        validate_credentials(email, password)?;
        let user = self.auth.sign_in(email.trim(), password).await?;
        debug!("signed in as {}", user.email);
        Ok(user)
    }

    /// Register a new account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthServiceError` for blank credentials or rejected sign-ups.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthServiceError> {
        validate_credentials(email, password)?;
        let user = self.auth.sign_up(email.trim(), password).await?;
        debug!("registered {}", user.email);
        Ok(user)
    }

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns `AuthServiceError` on backend failures.
    pub async fn sign_out(&self) -> Result<(), AuthServiceError> {
        self.auth.sign_out().await?;
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthServiceError> {
    if email.trim().is_empty() {
        return Err(AuthServiceError::EmptyEmail);
    }
    if password.is_empty() {
        return Err(AuthServiceError::EmptyPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote::Remote;

    #[tokio::test]
    async fn blank_credentials_are_rejected_before_any_request() {
        let remote = Remote::in_memory();
        let service = AuthService::new(remote.auth.clone());
        assert!(matches!(
            service.sign_in("  ", "pw").await,
            Err(AuthServiceError::EmptyEmail)
        ));
        assert!(matches!(
            service.sign_in("a@b.c", "").await,
            Err(AuthServiceError::EmptyPassword)
        ));
    }

    #[tokio::test]
    async fn sign_up_then_current_user_round_trips() {
        let remote = Remote::in_memory();
        let service = AuthService::new(remote.auth.clone());
        let user = service.sign_up("pat@example.com", "secret").await.unwrap();
        let current = service.current_user().await.unwrap();
        assert_eq!(current, Some(user));
    }
}
