use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

use easel_core::Clock;
use remote::postgrest::{RestConfig, RestInitError};
use remote::Remote;

use crate::account_service::AccountService;
use crate::auth_service::AuthService;
use crate::challenge_service::ChallengeService;
use crate::drawing_service::DrawingService;
use crate::exercise_service::ExerciseService;
use crate::lesson_service::LessonService;

/// Process-wide flags shared by every service consumer. Clones share the
/// same underlying state.
#[derive(Clone, Default)]
pub struct AppContext {
    maintenance: Arc<AtomicBool>,
}

impl AppContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the platform is in maintenance mode.
    #[must_use]
    pub fn maintenance(&self) -> bool {
        self.maintenance.load(Ordering::Relaxed)
    }

    /// Flip maintenance mode. Administrative surface only.
    pub fn set_maintenance(&self, on: bool) {
        if on {
            warn!("maintenance mode enabled");
        }
        self.maintenance.store(on, Ordering::Relaxed);
    }
}

/// Assembles the app-facing services over one remote backend.
#[derive(Clone)]
pub struct AppServices {
    context: AppContext,
    auth: Arc<AuthService>,
    lessons: Arc<LessonService>,
    exercises: Arc<ExerciseService>,
    challenges: Arc<ChallengeService>,
    drawings: Arc<DrawingService>,
    account: Arc<AccountService>,
}

impl AppServices {
    /// Wire every service against an already-built remote backend.
    #[must_use]
    pub fn new(remote: &Remote, clock: Clock) -> Self {
        let auth = Arc::new(AuthService::new(remote.auth.clone()));
        let lessons = Arc::new(LessonService::new(
            clock,
            remote.auth.clone(),
            remote.lessons.clone(),
            remote.exercises.clone(),
            remote.notes.clone(),
        ));
        let exercises = Arc::new(ExerciseService::new(
            clock,
            remote.auth.clone(),
            remote.exercises.clone(),
        ));
        let challenges = Arc::new(ChallengeService::new(
            clock,
            remote.auth.clone(),
            remote.challenges.clone(),
        ));
        let drawings = Arc::new(DrawingService::new(
            clock,
            remote.auth.clone(),
            remote.drawings.clone(),
        ));
        let account = Arc::new(AccountService::new(
            clock,
            remote.auth.clone(),
            remote.profiles.clone(),
            remote.activity.clone(),
            remote.lessons.clone(),
            remote.notes.clone(),
            remote.exercises.clone(),
            remote.challenges.clone(),
            remote.drawings.clone(),
        ));
        Self {
            context: AppContext::new(),
            auth,
            lessons,
            exercises,
            challenges,
            drawings,
            account,
        }
    }

    /// Services over a process-local backend, for tests and offline runs.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(&Remote::in_memory(), clock)
    }

    /// Services over the hosted backend.
    ///
    /// # Errors
    ///
    /// Returns `RestInitError` when the connection settings are unusable.
    pub fn postgrest(config: RestConfig, clock: Clock) -> Result<Self, RestInitError> {
        Ok(Self::new(&Remote::postgrest(config)?, clock))
    }

    #[must_use]
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn exercises(&self) -> Arc<ExerciseService> {
        Arc::clone(&self.exercises)
    }

    #[must_use]
    pub fn challenges(&self) -> Arc<ChallengeService> {
        Arc::clone(&self.challenges)
    }

    #[must_use]
    pub fn drawings(&self) -> Arc<DrawingService> {
        Arc::clone(&self.drawings)
    }

    #[must_use]
    pub fn account(&self) -> Arc<AccountService> {
        Arc::clone(&self.account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_core::time::fixed_clock;

    #[test]
    fn maintenance_flag_defaults_off_and_is_shared() {
        let context = AppContext::new();
        let view = context.clone();
        assert!(!view.maintenance());
        context.set_maintenance(true);
        assert!(view.maintenance());
        context.set_maintenance(false);
        assert!(!view.maintenance());
    }

    #[tokio::test]
    async fn in_memory_wiring_serves_requests() {
        let services = AppServices::in_memory(fixed_clock());
        let lessons = services.lessons().list_lessons().await.unwrap();
        assert!(lessons.is_empty());
    }
}
