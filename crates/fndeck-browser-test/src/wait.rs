//! Wait conditions for browser operations.
//!
//! UI state changes asynchronously after navigation and clicks, so tests need
//! to wait for conditions: page markers appearing, rows showing up, banners
//! rendering. This module provides a polling loop with a configurable timeout
//! plus a helper for the most common condition, element presence.

use crate::error::{BrowserError, Result};
use crate::session::UiSession;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Default timeout for wait operations (10 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default poll interval for checking conditions (100ms).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for wait operations.
///
/// Allows customizing timeout and poll interval for different scenarios.
/// For example, CI environments might need longer timeouts.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    /// Maximum time to wait for the condition.
    pub timeout: Duration,

    /// How often to check if the condition is satisfied.
    pub poll_interval: Duration,
}

impl WaitConfig {
    /// Creates a new wait configuration.
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Creates a config with custom timeout and default poll interval.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, DEFAULT_POLL_INTERVAL)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Polls a fallible condition until it reports true, with timeout.
///
/// The condition is re-checked every `poll_interval`. Errors from the
/// condition are treated as "not yet": a query racing a page load can fail
/// transiently and succeed on the next poll. Only the timeout turns into an
/// error, a [`BrowserError::WaitTimeout`] carrying `description`.
pub async fn wait_for_result<F, Fut>(condition: F, config: WaitConfig, description: &str) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();

    loop {
        match condition().await {
            Ok(true) => return Ok(()),
            Ok(false) | Err(_) => {
                // Keep polling on false or transient errors
            }
        }

        if start.elapsed() >= config.timeout {
            return Err(BrowserError::WaitTimeout {
                condition: description.to_string(),
                timeout: config.timeout,
            });
        }

        sleep(config.poll_interval).await;
    }
}

/// Waits until an element matching `selector` is present in the document.
///
/// This is the workhorse condition for page objects: after navigating or
/// clicking, wait for the marker element that proves the UI reached the
/// expected state.
///
/// # Errors
///
/// Returns `WaitTimeout` if the element never appears within the configured
/// timeout.
pub async fn element_present(
    session: &dyn UiSession,
    selector: &str,
    config: WaitConfig,
) -> Result<()> {
    wait_for_result(
        || async { session.exists(selector).await },
        config,
        &format!("selector '{selector}'"),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UiSession;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn wait_for_result_succeeds_immediately() {
        let result = wait_for_result(
            || async { Ok(true) },
            WaitConfig::default(),
            "test condition",
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn wait_for_result_retries_through_transient_errors() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = wait_for_result(
            move || {
                let c = counter_clone.clone();
                async move {
                    match c.fetch_add(1, Ordering::SeqCst) {
                        0 => Err(BrowserError::ScriptFailed("flaky".to_string())),
                        1 | 2 => Ok(false),
                        _ => Ok(true),
                    }
                }
            },
            WaitConfig::new(Duration::from_secs(5), Duration::from_millis(5)),
            "counter >= 3",
        )
        .await;

        assert!(result.is_ok());
        assert!(counter.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn wait_for_result_times_out() {
        let result = wait_for_result(
            || async { Ok(false) },
            WaitConfig::new(Duration::from_millis(100), Duration::from_millis(10)),
            "impossible condition",
        )
        .await;

        assert!(matches!(result, Err(BrowserError::WaitTimeout { .. })));
    }

    /// Session stub whose only live behavior is `exists` flipping to true
    /// after a few polls.
    struct AppearingElement {
        polls_until_present: u32,
        polls: AtomicU32,
    }

    #[async_trait]
    impl UiSession for AppearingElement {
        async fn navigate(&self, _url: &str) -> Result<()> {
            Ok(())
        }

        async fn current_url(&self) -> Result<String> {
            Ok("about:blank".to_string())
        }

        async fn exists(&self, _selector: &str) -> Result<bool> {
            Ok(self.polls.fetch_add(1, Ordering::SeqCst) >= self.polls_until_present)
        }

        async fn read_text(&self, selector: &str) -> Result<String> {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
        }

        async fn read_attribute(&self, selector: &str, _name: &str) -> Result<Option<String>> {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
        }

        async fn click(&self, selector: &str) -> Result<()> {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
        }

        async fn type_text(&self, selector: &str, _text: &str) -> Result<()> {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn element_present_waits_for_late_elements() {
        let session = AppearingElement {
            polls_until_present: 3,
            polls: AtomicU32::new(0),
        };

        let config = WaitConfig::new(Duration::from_secs(5), Duration::from_millis(5));
        let result = element_present(&session, "#late", config).await;

        assert!(result.is_ok());
        assert!(session.polls.load(Ordering::SeqCst) >= 4);
    }

    #[tokio::test]
    async fn element_present_times_out_on_missing_elements() {
        let session = AppearingElement {
            polls_until_present: u32::MAX,
            polls: AtomicU32::new(0),
        };

        let config = WaitConfig::new(Duration::from_millis(50), Duration::from_millis(10));
        let result = element_present(&session, "#never", config).await;

        match result {
            Err(BrowserError::WaitTimeout { condition, .. }) => {
                assert!(condition.contains("#never"));
            }
            other => panic!("expected WaitTimeout, got {other:?}"),
        }
    }
}
