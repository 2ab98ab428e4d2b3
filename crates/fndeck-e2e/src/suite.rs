//! The App Details page suite.
//!
//! Drives the whole lifecycle the console promises for one app: create it
//! from the home page, open its details page, then exercise the function
//! table through create, edit, a rejected oversized edit, and delete. The
//! app itself is removed again during teardown, pass or fail.
//!
//! Every scenario gets a fresh session so that leftover page state from one
//! scenario can never mask a bug in the next. The whole run is bounded by
//! [`Settings::suite_timeout_secs`]; a stuck console fails the suite instead
//! of hanging CI.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use fndeck_browser_test::SessionFactory;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::error::{HarnessError, Result};
use crate::fixtures::{AppDetails, FnDetails};
use crate::pages::{AppPage, HomePage};

/// Name of the function the suite creates, edits, and deletes.
const FN_NAME: &str = "myFn";

/// Image the function is created with.
const FN_IMAGE: &str = "fndemouser/myFn";

/// Image the edit scenario switches to.
const UPDATED_FN_IMAGE: &str = "fndemouser/myFn2";

/// Largest integer a browser number input holds losslessly. Far beyond any
/// memory allocation the console accepts, so the edit must be rejected.
const OVERSIZED_MEMORY: u64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    LoadsInterface,
    CreateFunction,
    EditFunction,
    RejectOversizedMemory,
    DeleteFunction,
}

impl Scenario {
    /// Scenarios run in this order; later ones build on earlier state,
    /// mirroring how a user works through the page.
    const ALL: [Scenario; 5] = [
        Scenario::LoadsInterface,
        Scenario::CreateFunction,
        Scenario::EditFunction,
        Scenario::RejectOversizedMemory,
        Scenario::DeleteFunction,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::LoadsInterface => "can load interface",
            Self::CreateFunction => "can create a function",
            Self::EditFunction => "can edit a function",
            Self::RejectOversizedMemory => "should disallow large memory allocation",
            Self::DeleteFunction => "can delete a function",
        }
    }
}

/// Result of a single scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    /// Human-readable scenario name.
    pub name: String,
    /// Whether the scenario passed.
    pub passed: bool,
    /// Wall-clock time the scenario took.
    pub duration_ms: u64,
    /// The failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated result of a full suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Number of scenarios that ran.
    pub total: usize,
    /// Number that passed.
    pub passed: usize,
    /// Number that failed.
    pub failed: usize,
    /// Wall-clock time for the whole suite, setup and teardown included.
    pub duration_ms: u64,
    /// Per-scenario results, in execution order.
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    /// Builds a report from individual outcomes.
    pub fn summarize(outcomes: Vec<ScenarioOutcome>, duration: Duration) -> Self {
        let passed = outcomes.iter().filter(|outcome| outcome.passed).count();
        Self {
            total: outcomes.len(),
            passed,
            failed: outcomes.len() - passed,
            duration_ms: duration.as_millis() as u64,
            outcomes,
        }
    }

    /// True when at least one scenario ran and none failed.
    pub fn all_passed(&self) -> bool {
        self.total > 0 && self.failed == 0
    }
}

/// Runs the App Details scenarios against a console.
///
/// The suite is generic over [`SessionFactory`], so the same code runs
/// against a headless Chrome pointed at a real console or against
/// [`SimConsole`](crate::sim::SimConsole) in unit tests.
pub struct AppPageSuite {
    settings: Settings,
    factory: Arc<dyn SessionFactory>,
    app: AppDetails,
    app_created: AtomicBool,
}

impl AppPageSuite {
    /// Creates a suite that works on a freshly named app.
    ///
    /// The random name keeps concurrent runs against a shared console from
    /// stepping on each other.
    pub fn new(settings: Settings, factory: Arc<dyn SessionFactory>) -> Self {
        Self::with_app(settings, factory, AppDetails::random())
    }

    /// Creates a suite that works on a specific app name.
    pub fn with_app(settings: Settings, factory: Arc<dyn SessionFactory>, app: AppDetails) -> Self {
        Self {
            settings,
            factory,
            app,
            app_created: AtomicBool::new(false),
        }
    }

    /// The app this suite creates and tears down.
    pub fn app(&self) -> &AppDetails {
        &self.app
    }

    /// Runs setup, all scenarios, and teardown, bounded by the suite budget.
    ///
    /// Setup failures abort the run with an error. Scenario failures are
    /// recorded in the report and do not stop later scenarios; check
    /// [`SuiteReport::all_passed`]. Teardown always runs once the app has
    /// been created, even after a timeout.
    pub async fn run(&self) -> Result<SuiteReport> {
        let budget = self.settings.suite_timeout();
        match tokio::time::timeout(budget, self.run_inner()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(app = %self.app.name, ?budget, "suite ran out of budget");
                if self.app_created.load(Ordering::SeqCst) {
                    // Best effort, on its own budget so a wedged console
                    // cannot hold the runner hostage twice.
                    match tokio::time::timeout(budget, self.teardown()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => warn!(%err, "teardown after timeout failed"),
                        Err(_) => warn!("teardown after timeout also ran out of budget"),
                    }
                }
                Err(HarnessError::SuiteTimeout { timeout: budget })
            }
        }
    }

    async fn run_inner(&self) -> Result<SuiteReport> {
        let result = self.execute().await;

        if self.app_created.load(Ordering::SeqCst) {
            if let Err(err) = self.teardown().await {
                warn!(%err, app = %self.app.name, "teardown failed");
                if result.is_ok() {
                    return Err(err);
                }
            }
        }

        result
    }

    async fn execute(&self) -> Result<SuiteReport> {
        let started = Instant::now();
        info!(app = %self.app.name, "starting app details suite");

        let app_url = self.setup().await?;

        let mut outcomes = Vec::with_capacity(Scenario::ALL.len());
        for scenario in Scenario::ALL {
            outcomes.push(self.run_scenario(scenario, &app_url).await);
        }

        let report = SuiteReport::summarize(outcomes, started.elapsed());
        info!(
            passed = report.passed,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "suite finished"
        );
        Ok(report)
    }

    /// Creates the app and captures its details page URL.
    async fn setup(&self) -> Result<String> {
        let home = HomePage::open(self.factory.as_ref(), &self.settings).await?;

        let body = async {
            home.create_app(&self.app).await?;
            self.app_created.store(true, Ordering::SeqCst);
            home.visit_app(&self.app.name).await?;
            home.current_url().await
        }
        .await;

        let quit = home.quit().await;
        let app_url = body?;
        quit?;

        info!(app = %self.app.name, url = %app_url, "app created");
        Ok(app_url)
    }

    /// Deletes the app from a fresh home page session.
    async fn teardown(&self) -> Result<()> {
        let home = HomePage::open(self.factory.as_ref(), &self.settings).await?;
        let body = home.delete_app(&self.app.name).await;
        let quit = home.quit().await;
        body?;
        quit?;

        self.app_created.store(false, Ordering::SeqCst);
        info!(app = %self.app.name, "app deleted");
        Ok(())
    }

    async fn run_scenario(&self, scenario: Scenario, app_url: &str) -> ScenarioOutcome {
        let started = Instant::now();
        let result = self.scenario_body(scenario, app_url).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                info!("✓ {} ({} ms)", scenario.name(), duration_ms);
                ScenarioOutcome {
                    name: scenario.name().to_string(),
                    passed: true,
                    duration_ms,
                    error: None,
                }
            }
            Err(err) => {
                error!("✗ {} - {}", scenario.name(), err);
                ScenarioOutcome {
                    name: scenario.name().to_string(),
                    passed: false,
                    duration_ms,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    /// Opens a fresh details page, runs the scenario against it, and always
    /// releases the session. The scenario's error wins over a quit error.
    async fn scenario_body(&self, scenario: Scenario, app_url: &str) -> Result<()> {
        let page =
            AppPage::open(self.factory.as_ref(), app_url, self.settings.wait_config()).await?;

        let body = match scenario {
            Scenario::LoadsInterface => self.check_interface(&page).await,
            Scenario::CreateFunction => self.create_function(&page).await,
            Scenario::EditFunction => self.edit_function(&page).await,
            Scenario::RejectOversizedMemory => self.reject_oversized_memory(&page).await,
            Scenario::DeleteFunction => self.delete_function(&page).await,
        };

        let quit = page.quit().await;
        body?;
        quit?;
        Ok(())
    }

    async fn check_interface(&self, page: &AppPage) -> Result<()> {
        if page.loaded_correctly().await? {
            Ok(())
        } else {
            Err(HarnessError::Operation(
                "app details page is missing expected interface elements".to_string(),
            ))
        }
    }

    async fn create_function(&self, page: &AppPage) -> Result<()> {
        let details = FnDetails::new(FN_NAME).with_image(FN_IMAGE);
        page.create_fn(&details).await?;

        let image = page.get_fn_image(FN_NAME).await?;
        if image != FN_IMAGE {
            return Err(HarnessError::Operation(format!(
                "new function shows image '{image}', expected '{FN_IMAGE}'"
            )));
        }
        Ok(())
    }

    async fn edit_function(&self, page: &AppPage) -> Result<()> {
        let details = FnDetails::new(FN_NAME).with_image(UPDATED_FN_IMAGE);
        page.edit_fn(&details).await?;

        let image = page.get_fn_image(FN_NAME).await?;
        if image != UPDATED_FN_IMAGE {
            return Err(HarnessError::Operation(format!(
                "function image is '{image}' after edit, expected '{UPDATED_FN_IMAGE}'"
            )));
        }
        Ok(())
    }

    /// The console must refuse an absurd memory allocation and leave the
    /// function untouched.
    async fn reject_oversized_memory(&self, page: &AppPage) -> Result<()> {
        let details = FnDetails::new(FN_NAME).with_memory(OVERSIZED_MEMORY);
        page.edit_fn(&details).await?;

        let message = page.get_error().await?;
        if message.is_empty() {
            return Err(HarnessError::Operation(
                "console accepted an oversized memory allocation".to_string(),
            ));
        }
        if !message.contains("out of range") {
            return Err(HarnessError::Operation(format!(
                "expected an out of range error, console said: '{message}'"
            )));
        }

        let image = page.get_fn_image(FN_NAME).await?;
        if image != UPDATED_FN_IMAGE {
            return Err(HarnessError::Operation(format!(
                "rejected edit must not change the function, but image became '{image}'"
            )));
        }
        Ok(())
    }

    async fn delete_function(&self, page: &AppPage) -> Result<()> {
        page.delete_fn(FN_NAME).await?;

        match page.get_fn_image(FN_NAME).await {
            Err(HarnessError::NotFound(_)) => Ok(()),
            Ok(image) => Err(HarnessError::Operation(format!(
                "function still present with image '{image}' after delete"
            ))),
            Err(err) => Err(err),
        }
    }
}
