//! Error types for the end-to-end harness.

use std::time::Duration;

use fndeck_browser_test::BrowserError;
use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Failures surfaced by page objects and the suite runner.
///
/// Driver-level failures pass through as [`HarnessError::Browser`] without
/// rewrapping, so a timeout or a lost session keeps its original context.
#[derive(Debug, Error)]
pub enum HarnessError {
    // Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    // Session and driver errors, passed through unchanged
    #[error(transparent)]
    Browser(#[from] BrowserError),

    // Console-level failures
    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation failed: {0}")]
    Operation(String),

    // Suite-level failures
    #[error("suite exceeded its {timeout:?} budget")]
    SuiteTimeout {
        /// The overall budget the suite ran against
        timeout: Duration,
    },
}
