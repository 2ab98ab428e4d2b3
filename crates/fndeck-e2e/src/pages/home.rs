//! The console home page: app list plus the create-app form.

use fndeck_browser_test::{
    element_present, wait_for_result, BrowserError, SessionFactory, UiSession, WaitConfig,
};
use tracing::warn;

use crate::config::Settings;
use crate::error::{HarnessError, Result};
use crate::fixtures::AppDetails;

use super::{selectors, submit_outcome};

/// Page object for `/`, where apps are listed, created, and deleted.
pub struct HomePage {
    session: Box<dyn UiSession>,
    base_url: String,
    wait: WaitConfig,
    closed: bool,
}

impl HomePage {
    /// Wraps an existing session without navigating anywhere.
    pub fn new(session: Box<dyn UiSession>, settings: &Settings) -> Self {
        Self {
            session,
            base_url: settings.url(""),
            wait: settings.wait_config(),
            closed: false,
        }
    }

    /// Opens a fresh session and navigates it to the home page.
    pub async fn open(factory: &dyn SessionFactory, settings: &Settings) -> Result<Self> {
        let session = factory.open_session().await?;
        let page = Self::new(session, settings);
        match page.visit().await {
            Ok(()) => Ok(page),
            Err(err) => {
                // Release the session even when the first navigation fails.
                let _ = page.quit().await;
                Err(err)
            }
        }
    }

    /// Navigates to the console home page and waits for the app list.
    pub async fn visit(&self) -> Result<()> {
        self.session.navigate(&self.base_url).await?;

        match element_present(self.session.as_ref(), selectors::APP_LIST, self.wait).await {
            Ok(()) => Ok(()),
            Err(BrowserError::WaitTimeout { .. }) => Err(BrowserError::NavigationFailed {
                url: self.base_url.clone(),
                reason: "app list never rendered".to_string(),
            }
            .into()),
            Err(other) => Err(other.into()),
        }
    }

    /// Creates an app through the create-app form.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Operation`] when the console rejects the app,
    /// for example because the name is already taken.
    pub async fn create_app(&self, app: &AppDetails) -> Result<()> {
        let link = selectors::app_link(&app.name);
        // Sampled before the submit: an already listed name means the row
        // cannot confirm the outcome later.
        let pre_existing = self.session.exists(&link).await?;

        self.session
            .type_text(selectors::APP_NAME_INPUT, &app.name)
            .await?;
        self.session.click(selectors::CREATE_APP_SUBMIT).await?;

        match submit_outcome(
            self.session.as_ref(),
            &link,
            pre_existing,
            self.wait,
            &format!("app '{}' created", app.name),
        )
        .await?
        {
            None => Ok(()),
            Some(message) => Err(HarnessError::Operation(message)),
        }
    }

    /// Follows the app's link to its details page.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NotFound`] when the app is not in the list.
    pub async fn visit_app(&self, app_name: &str) -> Result<()> {
        let link = selectors::app_link(app_name);
        match self.session.click(&link).await {
            Ok(()) => {}
            Err(BrowserError::ElementNotFound { .. }) => {
                return Err(HarnessError::NotFound(format!("no app named '{app_name}'")));
            }
            Err(other) => return Err(other.into()),
        }

        element_present(self.session.as_ref(), selectors::FN_LIST, self.wait).await?;
        Ok(())
    }

    /// Returns the URL the session is currently on.
    ///
    /// Used to capture an app's details URL right after [`visit_app`], so
    /// later page objects can go there directly.
    ///
    /// [`visit_app`]: HomePage::visit_app
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.session.current_url().await?)
    }

    /// Deletes an app from the home page list.
    ///
    /// The session must be on the home page; call [`visit`](HomePage::visit)
    /// first when in doubt. Deleting is not idempotent: once the app is gone,
    /// a second call fails with [`HarnessError::NotFound`].
    pub async fn delete_app(&self, app_name: &str) -> Result<()> {
        let button = selectors::app_delete_button(app_name);
        match self.session.click(&button).await {
            Ok(()) => {}
            Err(BrowserError::ElementNotFound { .. }) => {
                return Err(HarnessError::NotFound(format!("no app named '{app_name}'")));
            }
            Err(other) => return Err(other.into()),
        }

        let link = selectors::app_link(app_name);
        wait_for_result(
            || async { Ok(!self.session.exists(&link).await?) },
            self.wait,
            &format!("app '{app_name}' removed"),
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

impl Drop for HomePage {
    fn drop(&mut self) {
        if !self.closed {
            warn!("HomePage dropped without quit(), browser session may leak");
        }
    }
}
