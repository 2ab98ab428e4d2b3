//! End-to-end tests for the FnDeck console's App Details page.
//!
//! The crate is layered so the same scenarios run with or without a real
//! browser:
//!
//! - [`config`]: settings merged from defaults, `fndeck.toml`, and
//!   `FNDECK_`-prefixed environment variables.
//! - [`fixtures`]: the app and function descriptions scenarios work with.
//! - [`pages`]: page objects for the home page and the App Details page,
//!   written against the session traits from `fndeck-browser-test`.
//! - [`suite`]: the scenario runner, with setup, teardown, and reporting.
//! - [`sim`]: an in-memory console for testing the harness itself.
//!
//! # Example
//!
//! Run the full suite against the simulated console and verify that every
//! session was released:
//!
//! ```
//! use std::sync::Arc;
//!
//! use fndeck_e2e::{AppPageSuite, Settings, SimConsole};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> fndeck_e2e::Result<()> {
//! let console = SimConsole::new("http://sim.test");
//! let settings = Settings::new(console.base_url());
//! let suite = AppPageSuite::new(settings, Arc::new(console.clone()));
//!
//! let report = suite.run().await?;
//! assert!(report.all_passed());
//! assert_eq!(console.open_session_count(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! Against a real console, swap the factory for a
//! [`TestBrowser`](fndeck_browser_test::TestBrowser) and load [`Settings`]
//! from the environment; see `tests/live_console.rs`.

pub mod config;
pub mod error;
pub mod fixtures;
pub mod pages;
pub mod sim;
pub mod suite;

pub use config::{ConfigError, Settings, DEFAULT_CONFIG_FILE};
pub use error::{HarnessError, Result};
pub use fixtures::{AppDetails, FnDetails};
pub use pages::{AppPage, HomePage};
pub use sim::{SimConsole, MAX_FN_MEMORY_MB, MIN_FN_MEMORY_MB};
pub use suite::{AppPageSuite, ScenarioOutcome, SuiteReport};
