//! Harness-level tests: full suite runs against the simulated console,
//! including injected failures and the suite budget.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fndeck_browser_test::{BrowserError, Result as BrowserResult, SessionFactory, UiSession};
use fndeck_e2e::{
    AppDetails, AppPageSuite, HarnessError, ScenarioOutcome, Settings, SimConsole, SuiteReport,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A console that never answers. Stands in for a wedged backend.
struct HangingFactory;

#[async_trait]
impl SessionFactory for HangingFactory {
    async fn open_session(&self) -> BrowserResult<Box<dyn UiSession>> {
        std::future::pending::<()>().await;
        unreachable!("pending future never resolves")
    }
}

/// Delegates to a [`SimConsole`] but hangs forever on the nth `open_session`
/// call. Later calls get through again, so teardown after a timeout can run.
struct HangOnNthFactory {
    inner: SimConsole,
    hang_on: usize,
    calls: AtomicUsize,
}

impl HangOnNthFactory {
    fn new(inner: SimConsole, hang_on: usize) -> Self {
        Self {
            inner,
            hang_on,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SessionFactory for HangOnNthFactory {
    async fn open_session(&self) -> BrowserResult<Box<dyn UiSession>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.hang_on {
            std::future::pending::<()>().await;
            unreachable!("pending future never resolves")
        }
        self.inner.open_session().await
    }
}

/// Delegates to a [`SimConsole`] but fails the nth `open_session` call.
struct FlakyFactory {
    inner: SimConsole,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FlakyFactory {
    fn new(inner: SimConsole, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SessionFactory for FlakyFactory {
    async fn open_session(&self) -> BrowserResult<Box<dyn UiSession>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(BrowserError::ConnectionFailed(
                "injected session failure".to_string(),
            ));
        }
        self.inner.open_session().await
    }
}

#[tokio::test]
async fn suite_passes_against_the_sim_console() {
    init_tracing();
    let console = SimConsole::new("http://sim.test");
    let settings = Settings::new(console.base_url());
    let suite = AppPageSuite::new(settings, Arc::new(console.clone()));

    let report = suite.run().await.expect("suite should complete");

    assert!(report.all_passed(), "outcomes: {:?}", report.outcomes);
    assert_eq!(report.total, 5);
    assert_eq!(report.passed, 5);
    // Teardown removed the app and every session was released.
    assert!(!console.has_app(&suite.app().name));
    assert_eq!(console.open_session_count(), 0);
}

#[tokio::test]
async fn setup_failure_aborts_without_touching_the_existing_app() {
    init_tracing();
    let console = SimConsole::new("http://sim.test");
    console.seed_app("taken");
    let settings = Settings::new(console.base_url());
    let suite = AppPageSuite::with_app(
        settings,
        Arc::new(console.clone()),
        AppDetails::new("taken"),
    );

    let result = suite.run().await;

    assert!(
        matches!(result, Err(HarnessError::Operation(_))),
        "got {result:?}"
    );
    // The suite never owned this app, so teardown must leave it alone.
    assert!(console.has_app("taken"));
    assert_eq!(console.open_session_count(), 0);
}

#[tokio::test]
async fn scenario_failures_are_recorded_and_teardown_still_runs() {
    init_tracing();
    let console = SimConsole::new("http://sim.test");
    let settings = Settings::new(console.base_url());
    // Session 1 is setup, sessions 2..=6 are the five scenarios. Failing the
    // third call breaks "can create a function"; the scenarios that depend
    // on the function then fail too, but the suite keeps going.
    let factory = FlakyFactory::new(console.clone(), 3);
    let suite = AppPageSuite::new(settings, Arc::new(factory));

    let report = suite.run().await.expect("suite should still report");

    assert_eq!(report.total, 5);
    assert_eq!(report.passed, 1, "outcomes: {:?}", report.outcomes);
    assert_eq!(report.failed, 4);
    assert!(!report.all_passed());
    assert_eq!(report.outcomes[1].name, "can create a function");
    assert!(report.outcomes[1].error.is_some());
    // Teardown ran regardless of the failures.
    assert!(!console.has_app(&suite.app().name));
    assert_eq!(console.open_session_count(), 0);
}

#[tokio::test]
async fn suite_times_out_when_the_console_hangs() {
    init_tracing();
    let mut settings = Settings::new("http://sim.test");
    settings.suite_timeout_secs = 1;
    let suite = AppPageSuite::new(settings, Arc::new(HangingFactory));

    let result = suite.run().await;

    assert!(
        matches!(result, Err(HarnessError::SuiteTimeout { .. })),
        "got {result:?}"
    );
}

#[tokio::test]
async fn teardown_still_removes_the_app_after_a_timeout() {
    init_tracing();
    let console = SimConsole::new("http://sim.test");
    let mut settings = Settings::new(console.base_url());
    settings.suite_timeout_secs = 1;
    // Session 1 is setup, so the app exists when session 2 (the first
    // scenario) hangs and burns the whole budget.
    let factory = HangOnNthFactory::new(console.clone(), 2);
    let suite = AppPageSuite::new(settings, Arc::new(factory));

    let result = suite.run().await;

    assert!(
        matches!(result, Err(HarnessError::SuiteTimeout { .. })),
        "got {result:?}"
    );
    // The post-timeout teardown removed the app and released its session.
    assert!(!console.has_app(&suite.app().name));
    assert_eq!(console.open_session_count(), 0);
}

#[test]
fn report_summarizes_outcomes() {
    let outcome = |name: &str, passed: bool| ScenarioOutcome {
        name: name.to_string(),
        passed,
        duration_ms: 10,
        error: if passed {
            None
        } else {
            Some("boom".to_string())
        },
    };

    let report = SuiteReport::summarize(
        vec![
            outcome("first", true),
            outcome("second", false),
            outcome("third", true),
        ],
        Duration::from_millis(1234),
    );

    assert_eq!(report.total, 3);
    assert_eq!(report.passed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.duration_ms, 1234);
    assert!(!report.all_passed());

    let empty = SuiteReport::summarize(Vec::new(), Duration::ZERO);
    assert!(!empty.all_passed());
}
