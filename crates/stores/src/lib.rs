//! Headless state containers over the services layer.
//!
//! Each container owns its slice of fetched state, re-fetches on demand, and
//! exposes derived views as plain methods (a pull model; nothing notifies).
//! Failures never propagate: every operation returns a [`StoreResult`] and
//! parks the message in `last_error()`.

#![forbid(unsafe_code)]

pub mod auth;
pub mod challenges;
pub mod drawings;
pub mod exercises;
pub mod lessons;
pub mod result;
pub mod user;

pub use auth::AuthStore;
pub use challenges::ChallengesStore;
pub use drawings::DrawingsStore;
pub use exercises::ExercisesStore;
pub use lessons::LessonsStore;
pub use result::StoreResult;
pub use user::UserStore;
