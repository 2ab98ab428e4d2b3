//! Chrome-backed sessions over the DevTools protocol.
//!
//! This module provides `TestBrowser`, which owns the Chrome process, and
//! `CdpSession`, the [`UiSession`] implementation that drives one tab of it.
//! DOM reads go through `Runtime.evaluate` with JSON-escaped selectors;
//! clicks use real input events so the page sees the same interaction a user
//! would produce.
//!
//! # Resource Safety
//!
//! `TestBrowser` implements Drop so the Chrome process is killed even if
//! tests panic. Explicit cleanup via `close()` is still preferred for
//! graceful shutdown.

use crate::error::{BrowserError, Result};
use crate::session::{SessionFactory, UiSession};
use crate::wait::{wait_for_result, WaitConfig};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as ChromePage;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Configuration for launching a test browser.
///
/// Provides sensible defaults for headless testing with options
/// to customize for debugging or CI environments.
#[derive(Debug, Clone)]
pub struct TestBrowserConfig {
    /// Run in headless mode (default: true).
    pub headless: bool,

    /// Browser window size (default: 1920x1080).
    pub window_size: (u32, u32),

    /// Additional Chrome arguments.
    pub args: Vec<String>,

    /// Chrome executable path (None = auto-detect).
    pub chrome_path: Option<String>,

    /// Wait settings applied to every session opened from this browser.
    pub wait: WaitConfig,
}

impl TestBrowserConfig {
    /// Creates a new config with defaults for headless testing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables visible mode for debugging.
    ///
    /// When headless is false, you can watch the browser execute tests.
    #[must_use]
    pub fn visible(mut self) -> Self {
        self.headless = false;
        self
    }

    /// Sets a custom window size.
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Adds additional Chrome arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Overrides the wait settings handed to each session.
    #[must_use]
    pub fn with_wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Converts to chromiumoxide `BrowserConfig`.
    #[allow(clippy::result_large_err)]
    fn to_browser_config(&self) -> Result<BrowserConfig> {
        let mut config = BrowserConfig::builder();

        if self.headless {
            config = config.arg("--headless");
        }

        config = config.arg(format!(
            "--window-size={},{}",
            self.window_size.0, self.window_size.1
        ));

        // Unique user data directory so parallel browser instances don't
        // trip over Chrome's ProcessSingleton lock.
        let temp_dir = std::env::temp_dir();
        let unique_id = uuid::Uuid::new_v4();
        let user_data_dir = temp_dir.join(format!("fndeck-browser-test-{unique_id}"));
        config = config.arg(format!("--user-data-dir={}", user_data_dir.display()));

        for arg in &self.args {
            config = config.arg(arg.clone());
        }

        if let Some(path) = &self.chrome_path {
            config = config.chrome_executable(path.clone());
        }

        config.build().map_err(|e| BrowserError::LaunchFailed {
            reason: format!("invalid browser configuration: {e}"),
            source: None,
        })
    }
}

impl Default for TestBrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            args: vec![
                // Required when user namespaces are unavailable (common in
                // containers). Only safe because tests never load untrusted
                // content.
                "--no-sandbox".to_string(),
                // Prevents /dev/shm exhaustion in containerized environments
                "--disable-dev-shm-usage".to_string(),
            ],
            chrome_path: None,
            wait: WaitConfig::default(),
        }
    }
}

/// A managed Chrome instance that hands out [`CdpSession`]s.
///
/// Cloning yields another handle to the same browser; closing through any
/// handle closes it for all of them.
///
/// # Example
///
/// ```ignore
/// let browser = TestBrowser::launch(TestBrowserConfig::default()).await?;
/// let session = browser.new_session().await?;
/// session.navigate("https://example.com").await?;
/// session.close().await?;
/// browser.close().await?;
/// ```
#[derive(Clone)]
pub struct TestBrowser {
    inner: Arc<Mutex<Option<Browser>>>,
    wait: WaitConfig,
}

impl TestBrowser {
    /// Launches a new browser instance with the given configuration.
    ///
    /// This spawns a Chrome process and establishes a CDP connection.
    ///
    /// # Errors
    ///
    /// Returns `LaunchFailed` if Chrome is not installed, not executable,
    /// or fails to start.
    pub async fn launch(config: TestBrowserConfig) -> Result<Self> {
        debug!("Launching browser with config: {:?}", config);

        let browser_config = config.to_browser_config()?;

        let (browser, mut handler) =
            Browser::launch(browser_config)
                .await
                .map_err(|e| BrowserError::LaunchFailed {
                    reason: "failed to launch Chrome process".to_string(),
                    source: Some(Box::new(e)),
                })?;

        // Drive the browser handler; chromiumoxide needs this task alive to
        // process CDP events.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Browser handler error: {}", e);
                }
            }
        });

        debug!("Browser launched successfully");

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(browser))),
            wait: config.wait,
        })
    }

    /// Opens a fresh tab wrapped in a [`CdpSession`].
    ///
    /// Each session has independent page state.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyClosed` if the browser has been closed, or
    /// `ConnectionFailed` if the tab cannot be created.
    pub async fn new_session(&self) -> Result<CdpSession> {
        let browser = self.inner.lock().await;

        let browser = browser.as_ref().ok_or(BrowserError::AlreadyClosed)?;

        let tab = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        Ok(CdpSession::new(tab, self.wait))
    }

    /// Closes the browser and kills the Chrome process.
    ///
    /// This should be called explicitly at the end of tests for graceful
    /// shutdown. If not called, Drop will kill the process forcefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser fails to close gracefully.
    pub async fn close(self) -> Result<()> {
        let mut browser_guard = self.inner.lock().await;

        if let Some(mut browser) = browser_guard.take() {
            debug!("Closing browser gracefully");
            // Browser::close() requires &mut self
            browser
                .close()
                .await
                .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;
        }

        Ok(())
    }

    /// Returns true if the browser has been closed.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }
}

impl Drop for TestBrowser {
    fn drop(&mut self) {
        // Can't await here; chromiumoxide's Browser::drop kills the Chrome
        // process when the inner value goes away. Warn only from the last
        // handle, and only when the browser was never closed explicitly.
        if Arc::strong_count(&self.inner) == 1 {
            if let Ok(guard) = self.inner.try_lock() {
                if guard.is_some() {
                    warn!(
                        "TestBrowser dropped without explicit close() - forcing shutdown via Drop"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl SessionFactory for TestBrowser {
    async fn open_session(&self) -> Result<Box<dyn UiSession>> {
        Ok(Box::new(self.new_session().await?))
    }
}

/// [`UiSession`] implementation backed by one Chrome tab.
///
/// All DOM access runs JavaScript in the page, with selectors embedded via
/// JSON encoding so arbitrary selector strings cannot break out of the
/// script. Clicks go through CDP input events instead of synthetic
/// `dispatchEvent` calls.
pub struct CdpSession {
    tab: Mutex<Option<Arc<ChromePage>>>,
    wait: WaitConfig,
}

impl CdpSession {
    pub(crate) fn new(tab: ChromePage, wait: WaitConfig) -> Self {
        Self {
            tab: Mutex::new(Some(Arc::new(tab))),
            wait,
        }
    }

    /// Returns the live tab handle, or `AlreadyClosed`.
    async fn tab(&self) -> Result<Arc<ChromePage>> {
        self.tab.lock().await.clone().ok_or(BrowserError::AlreadyClosed)
    }

    /// Evaluates a script and returns the JSON value it produced, if any.
    async fn eval(&self, script: String) -> Result<Option<serde_json::Value>> {
        let tab = self.tab().await?;
        let result = tab
            .evaluate(script.as_str())
            .await
            .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?;
        Ok(result.value().cloned())
    }
}

#[async_trait]
impl UiSession for CdpSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let tab = self.tab().await?;
        debug!(url, "navigating");

        tab.goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        // Poll until the document finished loading. goto() resolves on the
        // navigation response, not on render completion.
        wait_for_result(
            || {
                let tab = tab.clone();
                async move {
                    let result = tab
                        .evaluate("document.readyState")
                        .await
                        .map_err(|e| BrowserError::ScriptFailed(e.to_string()))?;

                    let ready = result
                        .value()
                        .and_then(|v| v.as_str())
                        .is_some_and(|s| s == "complete");

                    Ok(ready)
                }
            },
            self.wait,
            "document ready",
        )
        .await
    }

    async fn current_url(&self) -> Result<String> {
        match self.eval("window.location.href".to_string()).await? {
            Some(serde_json::Value::String(url)) => Ok(url),
            other => Err(BrowserError::ScriptFailed(format!(
                "window.location.href returned {other:?}"
            ))),
        }
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        let escaped = js_string(selector)?;
        let value = self.eval(format!("!!document.querySelector({escaped})")).await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn read_text(&self, selector: &str) -> Result<String> {
        let escaped = js_string(selector)?;
        let script = format!(
            "(() => {{ const el = document.querySelector({escaped}); \
             return el === null ? null : (el.innerText ?? el.textContent ?? \"\"); }})()"
        );

        match self.eval(script).await? {
            Some(serde_json::Value::String(text)) => Ok(text),
            _ => Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            }),
        }
    }

    async fn read_attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        if !self.exists(selector).await? {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            });
        }

        let escaped = js_string(selector)?;
        let escaped_name = js_string(name)?;
        let script =
            format!("document.querySelector({escaped})?.getAttribute({escaped_name})");

        match self.eval(script).await? {
            Some(serde_json::Value::String(value)) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let tab = self.tab().await?;

        let element = tab
            .find_element(selector)
            .await
            .map_err(|e| element_error(e, selector))?;

        element.click().await.map_err(BrowserError::Cdp)?;
        Ok(())
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let escaped = js_string(selector)?;
        let escaped_text = js_string(text)?;
        // Set the value directly and fire the events frameworks listen for.
        let script = format!(
            "(() => {{ const el = document.querySelector({escaped}); \
             if (el === null) {{ return false; }} \
             el.value = {escaped_text}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
             return true; }})()"
        );

        match self.eval(script).await? {
            Some(serde_json::Value::Bool(true)) => Ok(()),
            _ => Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            }),
        }
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.tab.lock().await;

        if let Some(tab) = guard.take() {
            match Arc::try_unwrap(tab) {
                Ok(page) => {
                    page.close().await.map_err(BrowserError::Cdp)?;
                }
                Err(_) => {
                    // An in-flight operation still holds the handle; the tab
                    // goes away when the browser closes.
                    warn!("session tab still referenced, deferring close to browser shutdown");
                }
            }
        }

        Ok(())
    }
}

/// Classifies a failed element lookup.
///
/// Chrome answers a lookup on a missing node with a protocol error response,
/// which becomes `ElementNotFound`. Anything else (dropped connection,
/// request timeout) keeps its CDP cause so callers can tell a broken session
/// from a missing element.
fn element_error(err: CdpError, selector: &str) -> BrowserError {
    match err {
        CdpError::NotFound | CdpError::Chrome(_) => BrowserError::ElementNotFound {
            selector: selector.to_string(),
        },
        other => BrowserError::Cdp(other),
    }
}

/// Embeds a Rust string into JavaScript source as a quoted literal.
///
/// JSON encoding prevents injection via quotes, backticks, or newlines in
/// selectors and input text.
fn js_string(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| BrowserError::ScriptFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_string_quotes_plain_selectors() {
        assert_eq!(js_string("div").unwrap(), r#""div""#);
        assert_eq!(
            js_string(r#"[data-testid="app-list"]"#).unwrap(),
            r#""[data-testid=\"app-list\"]""#
        );
    }

    #[test]
    fn js_string_neutralizes_injection_attempts() {
        let dangerous = r#"'); alert('xss');//"#;
        let escaped = js_string(dangerous).unwrap();

        // Whatever the payload, it must end up inside one double-quoted
        // JavaScript string literal.
        assert!(escaped.starts_with('"') && escaped.ends_with('"'));
        assert!(!escaped[1..escaped.len() - 1].contains('"'));
    }

    #[test]
    fn element_lookup_errors_keep_their_transport_cause() {
        let missing = element_error(CdpError::NotFound, "#gone");
        assert!(matches!(missing, BrowserError::ElementNotFound { .. }));

        let protocol = element_error(
            CdpError::Chrome(chromiumoxide::types::Error {
                code: -32000,
                message: "Could not find node with given id".to_string(),
            }),
            "#gone",
        );
        assert!(matches!(protocol, BrowserError::ElementNotFound { .. }));

        let timed_out = element_error(CdpError::Timeout, "#gone");
        assert!(matches!(timed_out, BrowserError::Cdp(_)));
    }

    #[test]
    fn default_config_is_headless_with_container_args() {
        let config = TestBrowserConfig::default();

        assert!(config.headless);
        assert!(config.args.iter().any(|a| a == "--no-sandbox"));
        assert!(config.args.iter().any(|a| a == "--disable-dev-shm-usage"));
    }

    #[tokio::test]
    #[ignore] // Requires Chrome to be installed
    async fn browser_launch_and_close() {
        let browser = TestBrowser::launch(TestBrowserConfig::default())
            .await
            .expect("failed to launch browser");

        assert!(!browser.is_closed().await);

        browser.close().await.expect("failed to close browser");
    }
}
