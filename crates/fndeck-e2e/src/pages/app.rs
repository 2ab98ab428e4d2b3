//! The app details page: function list, create form, editor, delete.

use fndeck_browser_test::{
    element_present, wait_for_result, BrowserError, SessionFactory, UiSession, WaitConfig,
};
use tracing::warn;

use crate::error::{HarnessError, Result};
use crate::fixtures::FnDetails;

use super::{banner_text, selectors, submit_outcome};

/// Page object for `/app/{name}`, where an app's functions are managed.
///
/// Constructed from the details URL rather than the app name: suites capture
/// the URL once from the home page and hand it to each fresh `AppPage`.
pub struct AppPage {
    session: Box<dyn UiSession>,
    url: String,
    wait: WaitConfig,
    closed: bool,
}

impl AppPage {
    /// Wraps an existing session without navigating anywhere.
    pub fn new(session: Box<dyn UiSession>, url: impl Into<String>, wait: WaitConfig) -> Self {
        Self {
            session,
            url: url.into(),
            wait,
            closed: false,
        }
    }

    /// Opens a fresh session and navigates it to the app details page.
    pub async fn open(
        factory: &dyn SessionFactory,
        url: impl Into<String>,
        wait: WaitConfig,
    ) -> Result<Self> {
        let session = factory.open_session().await?;
        let page = Self::new(session, url, wait);
        match page.visit().await {
            Ok(()) => Ok(page),
            Err(err) => {
                // Release the session even when the first navigation fails.
                let _ = page.quit().await;
                Err(err)
            }
        }
    }

    /// Navigates to the details page and waits for the function list.
    ///
    /// # Errors
    ///
    /// A page that never renders its function list (unknown app, broken
    /// console) fails with a navigation error carrying the URL.
    pub async fn visit(&self) -> Result<()> {
        self.session.navigate(&self.url).await?;

        match element_present(self.session.as_ref(), selectors::FN_LIST, self.wait).await {
            Ok(()) => Ok(()),
            Err(BrowserError::WaitTimeout { .. }) => Err(BrowserError::NavigationFailed {
                url: self.url.clone(),
                reason: "function list never rendered".to_string(),
            }
            .into()),
            Err(other) => Err(other.into()),
        }
    }

    /// Returns true if the page shows everything the tests rely on: the
    /// function list, the app title, and the create-function form.
    pub async fn loaded_correctly(&self) -> Result<bool> {
        let session = self.session.as_ref();
        Ok(session.exists(selectors::FN_LIST).await?
            && session.exists(selectors::APP_TITLE).await?
            && session.exists(selectors::FN_NAME_INPUT).await?)
    }

    /// Creates a function through the create-function form.
    ///
    /// Only the fields set in `details` are typed; the rest stay at whatever
    /// the form defaults to.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Operation`] when the console rejects the
    /// function (duplicate name, missing image, bad memory value).
    pub async fn create_fn(&self, details: &FnDetails) -> Result<()> {
        let row = selectors::fn_row(&details.name);
        // Sampled before the submit: a duplicate name means the row cannot
        // confirm the outcome later.
        let pre_existing = self.session.exists(&row).await?;

        self.session
            .type_text(selectors::FN_NAME_INPUT, &details.name)
            .await?;
        if let Some(image) = &details.image {
            self.session
                .type_text(selectors::FN_IMAGE_INPUT, image)
                .await?;
        }
        if let Some(memory) = details.memory {
            self.session
                .type_text(selectors::FN_MEMORY_INPUT, &memory.to_string())
                .await?;
        }
        self.session.click(selectors::CREATE_FN_SUBMIT).await?;

        match submit_outcome(
            self.session.as_ref(),
            &row,
            pre_existing,
            self.wait,
            &format!("function '{}' created", details.name),
        )
        .await?
        {
            None => Ok(()),
            Some(message) => Err(HarnessError::Operation(message)),
        }
    }

    /// Edits a function through its row's editor.
    ///
    /// Fields left as `None` keep their current values. The call returns once
    /// the console settles, whether it applied the edit or rejected it; a
    /// rejection shows up through [`get_error`](AppPage::get_error), matching
    /// how a user experiences the page.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NotFound`] when no such function exists.
    pub async fn edit_fn(&self, details: &FnDetails) -> Result<()> {
        let edit_button = selectors::fn_edit_button(&details.name);
        match self.session.click(&edit_button).await {
            Ok(()) => {}
            Err(BrowserError::ElementNotFound { .. }) => {
                return Err(HarnessError::NotFound(format!(
                    "no function named '{}'",
                    details.name
                )));
            }
            Err(other) => return Err(other.into()),
        }

        element_present(self.session.as_ref(), selectors::FN_EDITOR, self.wait).await?;

        if let Some(image) = &details.image {
            self.session
                .type_text(selectors::EDIT_IMAGE_INPUT, image)
                .await?;
        }
        if let Some(memory) = details.memory {
            self.session
                .type_text(selectors::EDIT_MEMORY_INPUT, &memory.to_string())
                .await?;
        }
        self.session.click(selectors::EDIT_FN_SUBMIT).await?;

        // Settled means the editor closed (applied) or the banner filled in
        // (rejected). Both are valid outcomes of this call.
        wait_for_result(
            || async {
                if !self.session.exists(selectors::FN_EDITOR).await? {
                    return Ok(true);
                }
                Ok(banner_text(self.session.as_ref()).await?.is_some())
            },
            self.wait,
            &format!("edit of '{}' settled", details.name),
        )
        .await?;

        Ok(())
    }

    /// Returns the image currently shown in a function's row.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NotFound`] when no such function exists.
    pub async fn get_fn_image(&self, fn_name: &str) -> Result<String> {
        let cell = selectors::fn_image_cell(fn_name);
        match self.session.read_text(&cell).await {
            Ok(image) => Ok(image),
            Err(BrowserError::ElementNotFound { .. }) => Err(HarnessError::NotFound(format!(
                "no function named '{fn_name}'"
            ))),
            Err(other) => Err(other.into()),
        }
    }

    /// Returns the error banner text, or an empty string without a banner.
    ///
    /// An empty result is ambiguous: it covers both "no banner" and "banner
    /// present but blank". Callers asserting on specific error text are
    /// unaffected; callers asserting "no error" should know the two cases
    /// read the same.
    pub async fn get_error(&self) -> Result<String> {
        if !self.session.exists(selectors::ERROR_BANNER).await? {
            return Ok(String::new());
        }
        Ok(self.session.read_text(selectors::ERROR_BANNER).await?)
    }

    /// Deletes a function from its row.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NotFound`] when no such function exists.
    pub async fn delete_fn(&self, fn_name: &str) -> Result<()> {
        let button = selectors::fn_delete_button(fn_name);
        match self.session.click(&button).await {
            Ok(()) => {}
            Err(BrowserError::ElementNotFound { .. }) => {
                return Err(HarnessError::NotFound(format!(
                    "no function named '{fn_name}'"
                )));
            }
            Err(other) => return Err(other.into()),
        }

        let row = selectors::fn_row(fn_name);
        wait_for_result(
            || async { Ok(!self.session.exists(&row).await?) },
            self.wait,
            &format!("function '{fn_name}' removed"),
        )
        .await?;
        Ok(())
    }

    /// Releases the browser session.
    pub async fn quit(mut self) -> Result<()> {
        self.closed = true;
        self.session.close().await?;
        Ok(())
    }
}

impl Drop for AppPage {
    fn drop(&mut self) {
        if !self.closed {
            warn!("AppPage dropped without quit(), browser session may leak");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::sim::SimConsole;

    async fn open_app_page(console: &SimConsole, app_name: &str) -> AppPage {
        let settings = Settings::new(console.base_url());
        AppPage::open(console, settings.app_url(app_name), settings.wait_config())
            .await
            .expect("failed to open app page")
    }

    #[tokio::test]
    async fn loads_correctly_for_an_existing_app() {
        let console = SimConsole::new("http://sim.test");
        console.seed_app("alpha");

        let page = open_app_page(&console, "alpha").await;
        assert!(page.loaded_correctly().await.expect("loaded_correctly failed"));

        page.quit().await.expect("quit failed");
    }

    #[tokio::test]
    async fn visiting_an_unknown_app_fails_navigation() {
        let console = SimConsole::new("http://sim.test");
        let settings = Settings::new(console.base_url());
        // Tight wait keeps the failing poll loop short.
        let wait = WaitConfig::new(
            std::time::Duration::from_millis(50),
            std::time::Duration::from_millis(10),
        );

        let result = AppPage::open(&console, settings.app_url("ghost"), wait).await;

        match result {
            Err(HarnessError::Browser(BrowserError::NavigationFailed { url, .. })) => {
                assert!(url.ends_with("/app/ghost"));
            }
            Err(other) => panic!("expected NavigationFailed, got {other:?}"),
            Ok(_) => panic!("expected NavigationFailed, got a page"),
        }
        // The failed open released its session.
        assert_eq!(console.open_session_count(), 0);
    }

    #[tokio::test]
    async fn create_fn_without_image_is_rejected() {
        let console = SimConsole::new("http://sim.test");
        console.seed_app("alpha");

        let page = open_app_page(&console, "alpha").await;
        let result = page.create_fn(&FnDetails::new("myFn")).await;

        match result {
            Err(HarnessError::Operation(message)) => {
                assert!(message.contains("image"), "got: {message}");
            }
            other => panic!("expected Operation error, got {other:?}"),
        }

        page.quit().await.expect("quit failed");
    }

    #[tokio::test]
    async fn duplicate_fn_name_is_rejected() {
        let console = SimConsole::new("http://sim.test");
        console.seed_app("alpha");

        let page = open_app_page(&console, "alpha").await;
        let first = FnDetails::new("myFn").with_image("fndemouser/myFn");
        page.create_fn(&first).await.expect("first create failed");

        let second = FnDetails::new("myFn").with_image("fndemouser/other");
        let result = page.create_fn(&second).await;

        match result {
            Err(HarnessError::Operation(message)) => {
                assert!(message.contains("already exists"), "got: {message}");
            }
            other => panic!("expected Operation error, got {other:?}"),
        }

        page.quit().await.expect("quit failed");
    }

    #[tokio::test]
    async fn editing_an_unknown_fn_is_not_found() {
        let console = SimConsole::new("http://sim.test");
        console.seed_app("alpha");

        let page = open_app_page(&console, "alpha").await;
        let result = page
            .edit_fn(&FnDetails::new("ghost").with_image("fndemouser/ghost"))
            .await;

        assert!(matches!(result, Err(HarnessError::NotFound(_))));

        page.quit().await.expect("quit failed");
    }

    #[tokio::test]
    async fn get_error_is_empty_without_a_banner() {
        let console = SimConsole::new("http://sim.test");
        console.seed_app("alpha");

        let page = open_app_page(&console, "alpha").await;
        let error = page.get_error().await.expect("get_error failed");
        assert_eq!(error, "");

        page.quit().await.expect("quit failed");
    }
}
