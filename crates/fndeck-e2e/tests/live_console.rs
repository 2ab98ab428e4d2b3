//! The App Details suite against a real console in a real browser.
//!
//! Requires a running FnDeck console and a local Chrome or Chromium. Point
//! the harness at the console and opt in:
//!
//! ```text
//! FNDECK_FN_URL=http://localhost:4000 cargo test -p fndeck-e2e --test live_console -- --ignored --nocapture
//! ```
//!
//! Set `FNDECK_HEADLESS=false` to watch the run.

use std::sync::Arc;

use fndeck_browser_test::{TestBrowser, TestBrowserConfig};
use fndeck_e2e::{AppPageSuite, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::test]
#[ignore = "requires a running FnDeck console and a local Chrome"]
async fn app_details_suite_against_live_console() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let settings = Settings::load().expect("set FNDECK_FN_URL or provide fndeck.toml");

    let mut config = TestBrowserConfig::new().with_wait(settings.wait_config());
    config.headless = settings.headless;
    let browser = TestBrowser::launch(config)
        .await
        .expect("failed to launch Chrome");

    let suite = AppPageSuite::new(settings, Arc::new(browser.clone()));
    let report = suite.run().await;

    browser.close().await.expect("failed to close Chrome");

    let report = report.expect("suite failed before producing a report");
    assert!(
        report.all_passed(),
        "failed scenarios: {:?}",
        report
            .outcomes
            .iter()
            .filter(|outcome| !outcome.passed)
            .collect::<Vec<_>>()
    );
}
