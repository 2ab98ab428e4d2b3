//! # fndeck-browser-test
//!
//! Browser session primitives for end-to-end testing of the FnDeck console.
//!
//! This crate provides the small layer between raw browser automation and
//! page objects: launching headless Chrome, opening tabs, querying and
//! driving the DOM, and waiting for conditions. Everything a page object
//! needs is expressed through the [`UiSession`] trait, so test suites can run
//! against a real browser or an in-memory fake without changing.
//!
//! ## Architecture
//!
//! - **[`UiSession`]**: object-safe DOM primitives (navigate, exists, read,
//!   click, type, close)
//! - **[`SessionFactory`]**: opens fresh sessions, one per test scenario
//! - **[`TestBrowser`] / [`CdpSession`]**: the Chrome implementation, built
//!   on chromiumoxide
//! - **[`WaitConfig`]**: polling with timeouts for asynchronous UI state
//!
//! ## Example Usage
//!
//! ```ignore
//! use fndeck_browser_test::{
//!     element_present, TestBrowser, TestBrowserConfig, UiSession, WaitConfig,
//! };
//!
//! #[tokio::test]
//! async fn test_console_loads() -> Result<(), Box<dyn std::error::Error>> {
//!     let browser = TestBrowser::launch(TestBrowserConfig::default()).await?;
//!     let session = browser.new_session().await?;
//!
//!     session.navigate("http://localhost:4000").await?;
//!     element_present(&session, "[data-testid=\"app-list\"]", WaitConfig::default()).await?;
//!
//!     session.close().await?;
//!     browser.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Testing Strategy
//!
//! Unit tests cover the wait loop and script-escaping logic and run without a
//! browser. Integration tests in `tests/` drive real Chrome against data URLs
//! and are marked `#[ignore]`; run them with `cargo test -- --ignored` on a
//! machine with Chrome installed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod chrome;
pub mod error;
pub mod session;
pub mod wait;

// Re-export main types for convenience
pub use chrome::{CdpSession, TestBrowser, TestBrowserConfig};
pub use error::{BrowserError, Result};
pub use session::{SessionFactory, UiSession};
pub use wait::{element_present, wait_for_result, WaitConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
