//! HTTP adapter for a hosted PostgREST + GoTrue backend.
//!
//! Each repository method is one table request; the backend performs the
//! actual querying, auth, and persistence. The adapter only builds requests,
//! maps rows, and translates the backend's "no matching row" code into
//! [`RemoteError::NotFound`].

mod query;
mod tables;

use std::env;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use easel_core::model::{AuthUser, UserId};

use crate::repository::{AuthClient, RemoteError};

pub(crate) use query::Query;

/// Connection settings for the hosted backend.
#[derive(Clone, Debug)]
pub struct RestConfig {
    pub base_url: String,
    pub api_key: String,
}

impl RestConfig {
    /// Read `EASEL_REMOTE_URL` / `EASEL_REMOTE_KEY` from the environment.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("EASEL_REMOTE_URL").ok()?;
        let api_key = env::var("EASEL_REMOTE_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        Some(Self { base_url, api_key })
    }
}

/// Errors raised while constructing the adapter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RestInitError {
    #[error("remote base url cannot be empty")]
    EmptyBaseUrl,
}

#[derive(Clone, Debug)]
struct Session {
    access_token: String,
    user: AuthUser,
}

/// Client for the hosted backend; implements every repository trait.
pub struct RestRemote {
    http: Client,
    rest_base: String,
    auth_base: String,
    api_key: String,
    session: Mutex<Option<Session>>,
}

impl RestRemote {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `RestInitError::EmptyBaseUrl` for a blank base URL.
    pub fn new(config: RestConfig) -> Result<Self, RestInitError> {
        let base = config.base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(RestInitError::EmptyBaseUrl);
        }
        Ok(Self {
            http: Client::new(),
            rest_base: format!("{base}/rest/v1"),
            auth_base: format!("{base}/auth/v1"),
            api_key: config.api_key,
            session: Mutex::new(None),
        })
    }

    fn bearer_token(&self) -> String {
        self.session
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.access_token.clone()))
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn store_session(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = session;
        }
    }

    fn cached_user(&self) -> Option<AuthUser> {
        self.session
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|s| s.user.clone()))
    }

    pub(crate) fn table_url(&self, table: &str) -> String {
        format!("{}/{table}", self.rest_base)
    }

    pub(crate) fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.api_key.clone())
            .bearer_auth(self.bearer_token())
    }

    async fn password_grant(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, RemoteError> {
        let response = self
            .http
            .post(format!("{}{path}", self.auth_base))
            .header("apikey", self.api_key.clone())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| RemoteError::Operation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Operation(e.to_string()))?;
        let user = AuthUser {
            id: UserId::new(body.user.id),
            email: body.user.email,
        };
        self.store_session(Some(Session {
            access_token: body.access_token,
            user: user.clone(),
        }));
        Ok(user)
    }
}

#[async_trait]
impl AuthClient for RestRemote {
    async fn current_user(&self) -> Result<Option<AuthUser>, RemoteError> {
        Ok(self.cached_user())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        self.password_grant("/token?grant_type=password", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, RemoteError> {
        self.password_grant("/signup", email, password).await
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        let response = self
            .http
            .post(format!("{}/logout", self.auth_base))
            .header("apikey", self.api_key.clone())
            .bearer_auth(self.bearer_token())
            .send()
            .await
            .map_err(|e| RemoteError::Operation(e.to_string()))?;
        self.store_session(None);
        if response.status().is_success() || response.status().as_u16() == 401 {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn update_password(&self, new_password: &str) -> Result<(), RemoteError> {
        if self.cached_user().is_none() {
            return Err(RemoteError::NotAuthenticated);
        }
        let response = self
            .http
            .put(format!("{}/user", self.auth_base))
            .header("apikey", self.api_key.clone())
            .bearer_auth(self.bearer_token())
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await
            .map_err(|e| RemoteError::Operation(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }

    async fn delete_user(&self, user: UserId) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(format!("{}/admin/users/{}", self.auth_base, user))
            .header("apikey", self.api_key.clone())
            .bearer_auth(self.bearer_token())
            .send()
            .await
            .map_err(|e| RemoteError::Operation(e.to_string()))?;
        self.store_session(None);
        if response.status().is_success() {
            Ok(())
        } else {
            Err(error_from_response(response).await)
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: Uuid,
    email: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "error_description")]
    description: Option<String>,
}

/// The backend's "no matching row" code (single-row request, zero rows).
pub(crate) const NO_ROW_CODE: &str = "PGRST116";

pub(crate) async fn error_from_response(response: reqwest::Response) -> RemoteError {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => {
            if body.code.as_deref() == Some(NO_ROW_CODE) {
                return RemoteError::NotFound;
            }
            let message = body
                .message
                .or(body.description)
                .unwrap_or_else(|| status.to_string());
            RemoteError::Operation(message)
        }
        Err(_) => RemoteError::Operation(status.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_rejects_blank_base_url() {
        let result = RestRemote::new(RestConfig {
            base_url: "   ".into(),
            api_key: "key".into(),
        });
        assert!(matches!(result, Err(RestInitError::EmptyBaseUrl)));
    }

    #[test]
    fn bases_are_derived_from_one_url() {
        let remote = RestRemote::new(RestConfig {
            base_url: "https://demo.example.co/".into(),
            api_key: "key".into(),
        })
        .unwrap();
        assert_eq!(remote.table_url("lessons"), "https://demo.example.co/rest/v1/lessons");
        assert_eq!(remote.auth_base, "https://demo.example.co/auth/v1");
    }

    #[test]
    fn anonymous_requests_fall_back_to_api_key() {
        let remote = RestRemote::new(RestConfig {
            base_url: "https://demo.example.co".into(),
            api_key: "anon-key".into(),
        })
        .unwrap();
        assert_eq!(remote.bearer_token(), "anon-key");
    }
}
