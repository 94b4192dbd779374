use std::time::Duration;

use thiserror::Error;

use crate::export::ExportError;

/// Failures reported by a browser-automation driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("{action} timed out after {after:?}")]
    Timeout { action: String, after: Duration },
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("browser protocol error: {0}")]
    Protocol(String),
    #[error("io error: {0}")]
    Io(String),
}

impl DriverError {
    pub fn timeout(action: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            action: action.into(),
            after,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}

/// Login failures. All of them are fatal for the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("login form never became interactive: {0}")]
    FormNotInteractive(DriverError),
    #[error("invalid credentials: still on login page {url}")]
    InvalidCredentials { url: String },
    #[error("login submission failed: {0}")]
    Submit(DriverError),
}

/// Failures while loading or reading one listing page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("malformed listing snapshot: {0}")]
    Snapshot(String),
    #[error("pagination control missing: {0}")]
    MissingControl(String),
}

/// Run-level failure returned by [`crate::Harvester::run`].
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("navigation to page {page} failed after {attempts} retries: {message}")]
    Navigation {
        page: u32,
        attempts: u32,
        message: String,
    },
    #[error("page {page} stalled after {attempts} retries")]
    Stalled { page: u32, attempts: u32 },
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("browser driver failed: {0}")]
    Driver(#[from] DriverError),
    #[error("harvest ended unexpectedly: {0}")]
    Incomplete(String),
}
