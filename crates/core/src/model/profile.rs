use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ActivityId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("display name cannot be empty")]
    EmptyName,
}

/// The identity the auth backend reports for the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
}

/// A user's profile row, keyed by the auth identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A fresh profile derived from the auth identity; the display name
    /// defaults to the local part of the email address.
    #[must_use]
    pub fn from_auth(user: &AuthUser, now: DateTime<Utc>) -> Self {
        let name = user
            .email
            .split('@')
            .next()
            .filter(|part| !part.is_empty())
            .unwrap_or("User")
            .to_owned();
        Self {
            id: user.id,
            email: user.email.clone(),
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update to a profile row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfilePatch {
    /// A patch changing only the display name.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::EmptyName` when the name is blank.
    pub fn rename(name: impl Into<String>) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(Self {
            name: Some(name),
            email: None,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// One entry in a user's activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActivity {
    pub id: ActivityId,
    pub user_id: UserId,
    pub activity_type: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}
