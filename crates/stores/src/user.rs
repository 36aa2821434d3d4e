use std::sync::Arc;

use easel_core::model::{ProfilePatch, UserActivity, UserProfile};
use services::{AccountService, UserStats};

use crate::result::{StoreResult, StoreState};

const RECENT_ACTIVITY_LIMIT: u32 = 10;

/// Profile, dashboard stats, and account-lifecycle state.
pub struct UserStore {
    service: Arc<AccountService>,
    state: StoreState,
    profile: Option<UserProfile>,
    stats: Option<UserStats>,
    activity: Vec<UserActivity>,
}

impl UserStore {
    #[must_use]
    pub fn new(service: Arc<AccountService>) -> Self {
        Self {
            service,
            state: StoreState::default(),
            profile: None,
            stats: None,
            activity: Vec::new(),
        }
    }

    /// Fetch (or create) the user's profile.
    pub async fn load_profile(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.profile().await {
            Ok(profile) => {
                self.profile = Some(profile);
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Apply a profile patch and keep the updated row.
    pub async fn update_profile(&mut self, patch: ProfilePatch) -> StoreResult<UserProfile> {
        self.state.begin();
        match self.service.update_profile(patch).await {
            Ok(profile) => {
                self.profile = Some(profile.clone());
                self.state.finish_ok(profile)
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Fetch the dashboard numbers and the recent activity feed. The two
    /// reads go out concurrently.
    pub async fn load_dashboard(&mut self) -> StoreResult<()> {
        self.state.begin();
        let (stats, activity) = tokio::join!(
            self.service.stats(),
            self.service.recent_activity(RECENT_ACTIVITY_LIMIT)
        );
        let stats = match stats {
            Ok(stats) => stats,
            Err(e) => return self.state.finish_err(e),
        };
        match activity {
            Ok(activity) => {
                self.stats = Some(stats);
                self.activity = activity;
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Change the password after verifying the current one.
    pub async fn change_password(
        &mut self,
        current_password: &str,
        new_password: &str,
    ) -> StoreResult<()> {
        self.state.begin();
        match self
            .service
            .change_password(current_password, new_password)
            .await
        {
            Ok(()) => self.state.finish_ok(()),
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Bundle the user's data as one JSON document.
    pub async fn export_data(&mut self) -> StoreResult<serde_json::Value> {
        self.state.begin();
        match self.service.export_data().await {
            Ok(bundle) => self.state.finish_ok(bundle),
            Err(e) => self.state.finish_err(e),
        }
    }

    /// Delete the account and clear the held state.
    pub async fn delete_account(&mut self) -> StoreResult<()> {
        self.state.begin();
        match self.service.delete_account().await {
            Ok(()) => {
                self.profile = None;
                self.stats = None;
                self.activity.clear();
                self.state.finish_ok(())
            }
            Err(e) => self.state.finish_err(e),
        }
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> Option<&UserStats> {
        self.stats.as_ref()
    }

    #[must_use]
    pub fn recent_activity(&self) -> &[UserActivity] {
        &self.activity
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
