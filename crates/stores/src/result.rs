use std::fmt::Display;

use serde::Serialize;
use tracing::warn;

/// Structured outcome of a store operation. Callers check `success` (or use
/// [`StoreResult::is_ok`]) instead of matching on an error type; the message,
/// when present, is already user-presentable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> StoreResult<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.success
    }
}

/// Busy flag and last-error message shared by every container.
#[derive(Debug, Clone, Default)]
pub(crate) struct StoreState {
    busy: bool,
    last_error: Option<String>,
}

impl StoreState {
    pub(crate) fn begin(&mut self) {
        self.busy = true;
    }

    pub(crate) fn finish_ok<T>(&mut self, data: T) -> StoreResult<T> {
        self.busy = false;
        self.last_error = None;
        StoreResult::ok(data)
    }

    pub(crate) fn finish_err<T>(&mut self, error: impl Display) -> StoreResult<T> {
        let message = error.to_string();
        warn!("store operation failed: {message}");
        self.busy = false;
        self.last_error = Some(message.clone());
        StoreResult::failed(message)
    }

    pub(crate) fn busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
