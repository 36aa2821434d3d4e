//! Data access for the drawing practice platform.
//!
//! The [`repository`] module defines the async trait seams; [`memory`] is a
//! process-local backend for tests and offline runs, and [`postgrest`] talks
//! to the hosted backend.

#![forbid(unsafe_code)]

pub mod memory;
pub mod postgrest;
pub mod repository;

pub use memory::InMemoryRemote;
pub use postgrest::{RestConfig, RestInitError, RestRemote};
pub use repository::{Remote, RemoteError};
