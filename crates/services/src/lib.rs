#![forbid(unsafe_code)]

pub mod account_service;
pub mod app_services;
pub mod auth_service;
pub mod challenge_service;
pub mod drawing_service;
pub mod error;
pub mod exercise_service;
pub mod lesson_service;

pub use easel_core::Clock;

pub use account_service::{AccountService, ActiveChallenge, UserStats};
pub use app_services::{AppContext, AppServices};
pub use auth_service::AuthService;
pub use challenge_service::ChallengeService;
pub use drawing_service::DrawingService;
pub use error::{
    AccountServiceError, AuthServiceError, ChallengeServiceError, DrawingServiceError,
    ExerciseServiceError, LessonServiceError,
};
pub use exercise_service::ExerciseService;
pub use lesson_service::LessonService;
