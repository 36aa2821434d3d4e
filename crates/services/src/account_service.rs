use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use easel_core::model::{
    AuthUser, ProfilePatch, UserActivity, UserProfile,
};
use easel_core::Clock;
use remote::repository::{
    ActivityRepository, AuthClient, ChallengeRepository, DrawingRepository, ExerciseRepository,
    LessonNoteRepository, LessonRepository, ProfileRepository,
};

use crate::error::AccountServiceError;

/// Headline numbers for a user's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub completed_exercises: usize,
    pub total_drawings: usize,
    pub hours_drawing: f64,
    pub completed_challenges: usize,
    pub active_challenges: Vec<ActiveChallenge>,
}

/// One in-progress challenge for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveChallenge {
    pub title: String,
    pub current_count: u32,
    pub target_count: u32,
    pub completion_ratio: f64,
}

/// Profile, stats, and account-lifecycle operations.
#[derive(Clone)]
pub struct AccountService {
    clock: Clock,
    auth: Arc<dyn AuthClient>,
    profiles: Arc<dyn ProfileRepository>,
    activity: Arc<dyn ActivityRepository>,
    lessons: Arc<dyn LessonRepository>,
    notes: Arc<dyn LessonNoteRepository>,
    exercises: Arc<dyn ExerciseRepository>,
    challenges: Arc<dyn ChallengeRepository>,
    drawings: Arc<dyn DrawingRepository>,
}

impl AccountService {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: Clock,
        auth: Arc<dyn AuthClient>,
        profiles: Arc<dyn ProfileRepository>,
        activity: Arc<dyn ActivityRepository>,
        lessons: Arc<dyn LessonRepository>,
        notes: Arc<dyn LessonNoteRepository>,
        exercises: Arc<dyn ExerciseRepository>,
        challenges: Arc<dyn ChallengeRepository>,
        drawings: Arc<dyn DrawingRepository>,
    ) -> Self {
        Self {
            clock,
            auth,
            profiles,
            activity,
            lessons,
            notes,
            exercises,
            challenges,
            drawings,
        }
    }

    async fn current_user(&self) -> Result<AuthUser, AccountServiceError> {
        self.auth
            .current_user()
            .await?
            .ok_or(AccountServiceError::NotAuthenticated)
    }

    /// The signed-in user's profile, created from the auth identity on
    /// first access.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn profile(&self) -> Result<UserProfile, AccountServiceError> {
        let user = self.current_user().await?;
        match self.profiles.get_profile(user.id).await? {
            Some(existing) => Ok(existing),
            None => {
                let fresh = UserProfile::from_auth(&user, self.clock.now());
                debug!("creating profile for {}", user.email);
                Ok(self.profiles.insert_profile(&fresh).await?)
            }
        }
    }

    /// Apply a partial profile update. An empty patch is a no-op returning
    /// the current profile.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn update_profile(
        &self,
        patch: ProfilePatch,
    ) -> Result<UserProfile, AccountServiceError> {
        if patch.is_empty() {
            return self.profile().await;
        }
        let user = self.current_user().await?;
        Ok(self
            .profiles
            .update_profile(user.id, &patch, self.clock.now())
            .await?)
    }

    /// Change the password after verifying the current one by signing in
    /// again.
    ///
    /// # Errors
    ///
    /// Returns `WrongPassword` when the current password does not verify.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountServiceError> {
        let user = self.current_user().await?;
        if self
            .auth
            .sign_in(&user.email, current_password)
            .await
            .is_err()
        {
            return Err(AccountServiceError::WrongPassword);
        }
        self.auth.update_password(new_password).await?;
        debug!("password changed for {}", user.email);
        Ok(())
    }

    /// Assemble the dashboard numbers for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn stats(&self) -> Result<UserStats, AccountServiceError> {
        let user = self.current_user().await?;

        let lessons = self.lessons.list_lessons().await?;
        let completed_lessons = self.exercises.completed_lesson_ids(user.id).await?;
        let completed_exercises = self.exercises.completed_for_user(user.id).await?;
        let drawings = self.drawings.drawings_for_user(user.id).await?;
        let completed_challenges = self.challenges.completed_for_user(user.id).await?;
        let active = self.challenges.active_for_user(user.id).await?;

        let minutes: u64 = drawings
            .iter()
            .filter_map(|d| d.drawing.time_spent_minutes)
            .map(u64::from)
            .sum();
        let active_challenges = active
            .iter()
            .map(|(progress, challenge)| ActiveChallenge {
                title: challenge.title.clone(),
                current_count: progress.current_count,
                target_count: challenge.target_count,
                completion_ratio: progress.completion_ratio(challenge.target_count),
            })
            .collect();

        Ok(UserStats {
            total_lessons: lessons.len(),
            completed_lessons: completed_lessons.len(),
            completed_exercises: completed_exercises.len(),
            total_drawings: drawings.len(),
            hours_drawing: minutes as f64 / 60.0,
            completed_challenges: completed_challenges.len(),
            active_challenges,
        })
    }

    /// The signed-in user's newest activity entries.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn recent_activity(
        &self,
        limit: u32,
    ) -> Result<Vec<UserActivity>, AccountServiceError> {
        let user = self.current_user().await?;
        Ok(self.activity.recent_for_user(user.id, limit).await?)
    }

    /// Bundle the signed-in user's data as one JSON document.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn export_data(&self) -> Result<serde_json::Value, AccountServiceError> {
        let user = self.current_user().await?;

        let profile = self.profiles.get_profile(user.id).await?;
        let drawings = self.drawings.drawings_for_user(user.id).await?;
        let activity = self.activity.list_for_user(user.id).await?;
        let exercise_progress = self.exercises.completed_for_user(user.id).await?;
        let challenge_progress = self.challenges.completed_for_user(user.id).await?;

        Ok(serde_json::json!({
            "exported_at": self.clock.now(),
            "profile": serde_json::to_value(&profile)?,
            "drawings": serde_json::to_value(&drawings)?,
            "activity": serde_json::to_value(&activity)?,
            "completed_exercises": serde_json::to_value(&exercise_progress)?,
            "completed_challenges": serde_json::to_value(&challenge_progress)?,
        }))
    }

    /// Delete the signed-in user's account: owned rows first, then the
    /// profile, then the auth identity.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` when nobody is signed in.
    pub async fn delete_account(&self) -> Result<(), AccountServiceError> {
        let user = self.current_user().await?;
        warn!("deleting account {}", user.email);

        self.challenges.delete_user_data(user.id).await?;
        self.exercises.delete_user_data(user.id).await?;
        self.drawings.delete_user_data(user.id).await?;
        self.activity.delete_user_data(user.id).await?;
        self.notes.delete_user_data(user.id).await?;
        self.profiles.delete_profile(user.id).await?;
        self.auth.delete_user(user.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::model::{NewDrawing, ProfileError};
    use easel_core::time::{fixed_clock, fixed_now};
    use remote::{InMemoryRemote, Remote};

    fn service(remote: &Remote) -> AccountService {
        AccountService::new(
            fixed_clock(),
            remote.auth.clone(),
            remote.profiles.clone(),
            remote.activity.clone(),
            remote.lessons.clone(),
            remote.notes.clone(),
            remote.exercises.clone(),
            remote.challenges.clone(),
            remote.drawings.clone(),
        )
    }

    fn signed_in(backend: &InMemoryRemote) -> AuthUser {
        let user = backend.register_user("pat@example.com", "pw");
        backend.set_current_user(Some(user.clone()));
        user
    }

    #[tokio::test]
    async fn profile_is_created_with_the_email_local_part() {
        let backend = InMemoryRemote::new();
        signed_in(&backend);
        let remote = Remote::from_memory(backend);
        let service = service(&remote);

        let profile = service.profile().await.unwrap();
        assert_eq!(profile.name, "pat");
        assert_eq!(profile.created_at, fixed_now());

        // Second access returns the stored row.
        let again = service.profile().await.unwrap();
        assert_eq!(again, profile);
    }

    #[tokio::test]
    async fn rename_patch_round_trips() {
        let backend = InMemoryRemote::new();
        signed_in(&backend);
        let remote = Remote::from_memory(backend);
        let service = service(&remote);
        service.profile().await.unwrap();

        let renamed = service
            .update_profile(ProfilePatch::rename("Pat the Painter").unwrap())
            .await
            .unwrap();
        assert_eq!(renamed.name, "Pat the Painter");
        assert!(matches!(
            ProfilePatch::rename("  "),
            Err(ProfileError::EmptyName)
        ));
    }

    #[tokio::test]
    async fn change_password_rejects_a_wrong_current_password() {
        let backend = InMemoryRemote::new();
        signed_in(&backend);
        let remote = Remote::from_memory(backend);
        let service = service(&remote);

        let result = service.change_password("nope", "next").await;
        assert!(matches!(result, Err(AccountServiceError::WrongPassword)));
        service.change_password("pw", "next").await.unwrap();
    }

    #[tokio::test]
    async fn stats_count_drawing_hours() {
        let backend = InMemoryRemote::new();
        signed_in(&backend);
        let remote = Remote::from_memory(backend);
        let service = service(&remote);

        let user = remote.auth.current_user().await.unwrap().unwrap();
        for minutes in [30, 60] {
            let draft = NewDrawing::new("https://img.example/d.png", minutes, "", None).unwrap();
            remote
                .drawings
                .insert_drawing(user.id, &draft, fixed_now())
                .await
                .unwrap();
        }

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_drawings, 2);
        assert!((stats.hours_drawing - 1.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn delete_account_removes_the_profile_and_session() {
        let backend = InMemoryRemote::new();
        let user = signed_in(&backend);
        let remote = Remote::from_memory(backend);
        let service = service(&remote);
        service.profile().await.unwrap();

        service.delete_account().await.unwrap();
        assert_eq!(remote.profiles.get_profile(user.id).await.unwrap(), None);
        assert_eq!(remote.auth.current_user().await.unwrap(), None);
        assert!(matches!(
            service.profile().await,
            Err(AccountServiceError::NotAuthenticated)
        ));
    }
}
