//! Page objects for the FnDeck console.
//!
//! Each page object owns one [`UiSession`] and exposes the operations a test
//! performs on that page. Sessions are acquired through a factory, used for
//! the lifetime of the page object, and released with `quit()`; a page object
//! dropped without `quit()` logs a warning because the backing browser tab
//! would outlive the test.
//!
//! [`UiSession`]: fndeck_browser_test::UiSession

pub mod app;
pub mod home;

pub use app::AppPage;
pub use home::HomePage;

use fndeck_browser_test::{wait_for_result, BrowserError, UiSession, WaitConfig};

/// The `data-testid` contract between the console markup and this harness.
///
/// Names are interpolated into selectors verbatim; the harness only generates
/// alphabetic names, so no selector escaping is applied here.
pub(crate) mod selectors {
    /// Marker that the home page rendered its app list.
    pub const APP_LIST: &str = "[data-testid=\"app-list\"]";
    /// Name field of the create-app form.
    pub const APP_NAME_INPUT: &str = "[data-testid=\"app-name-input\"]";
    /// Submit button of the create-app form.
    pub const CREATE_APP_SUBMIT: &str = "[data-testid=\"create-app-submit\"]";

    /// Marker that an app details page rendered its function list.
    pub const FN_LIST: &str = "[data-testid=\"fn-list\"]";
    /// Heading showing the app name on its details page.
    pub const APP_TITLE: &str = "[data-testid=\"app-title\"]";
    /// Name field of the create-function form.
    pub const FN_NAME_INPUT: &str = "[data-testid=\"fn-name-input\"]";
    /// Image field of the create-function form.
    pub const FN_IMAGE_INPUT: &str = "[data-testid=\"fn-image-input\"]";
    /// Memory field of the create-function form.
    pub const FN_MEMORY_INPUT: &str = "[data-testid=\"fn-memory-input\"]";
    /// Submit button of the create-function form.
    pub const CREATE_FN_SUBMIT: &str = "[data-testid=\"create-fn-submit\"]";

    /// Marker that the function editor is open.
    pub const FN_EDITOR: &str = "[data-testid=\"fn-editor\"]";
    /// Image field of the function editor.
    pub const EDIT_IMAGE_INPUT: &str = "[data-testid=\"edit-fn-image-input\"]";
    /// Memory field of the function editor.
    pub const EDIT_MEMORY_INPUT: &str = "[data-testid=\"edit-fn-memory-input\"]";
    /// Submit button of the function editor.
    pub const EDIT_FN_SUBMIT: &str = "[data-testid=\"edit-fn-submit\"]";

    /// Banner the console shows when an operation is rejected.
    pub const ERROR_BANNER: &str = "[data-testid=\"error-banner\"]";

    /// Link to an app's details page in the home page list.
    pub fn app_link(name: &str) -> String {
        format!("[data-testid=\"app-link-{name}\"]")
    }

    /// Delete button for an app in the home page list.
    pub fn app_delete_button(name: &str) -> String {
        format!("[data-testid=\"delete-app-{name}\"]")
    }

    /// A function's row in the app details list.
    pub fn fn_row(name: &str) -> String {
        format!("[data-testid=\"fn-row-{name}\"]")
    }

    /// The image cell inside a function's row.
    pub fn fn_image_cell(name: &str) -> String {
        format!("[data-testid=\"fn-image-{name}\"]")
    }

    /// Edit button inside a function's row.
    pub fn fn_edit_button(name: &str) -> String {
        format!("[data-testid=\"edit-fn-{name}\"]")
    }

    /// Delete button inside a function's row.
    pub fn fn_delete_button(name: &str) -> String {
        format!("[data-testid=\"delete-fn-{name}\"]")
    }
}

/// Reads the error banner, treating an absent or blank banner as no error.
pub(crate) async fn banner_text(
    session: &dyn UiSession,
) -> Result<Option<String>, BrowserError> {
    if !session.exists(selectors::ERROR_BANNER).await? {
        return Ok(None);
    }

    let text = session.read_text(selectors::ERROR_BANNER).await?;
    if text.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

/// Waits until `target` appears or the console rejects the operation.
///
/// Returns `Ok(None)` when the target showed up and `Ok(Some(message))` when
/// the error banner did instead. Used after submitting create forms, where
/// the outcome is either a new row or a rejection. A banner that clears
/// between the wait settling and the re-read still counts as a rejection.
pub(crate) async fn row_or_error(
    session: &dyn UiSession,
    target: &str,
    wait: WaitConfig,
    what: &str,
) -> Result<Option<String>, BrowserError> {
    wait_for_result(
        || async {
            if session.exists(target).await? {
                return Ok(true);
            }
            Ok(banner_text(session).await?.is_some())
        },
        wait,
        what,
    )
    .await?;

    // Prefer the row: if it exists the operation went through, whatever the
    // banner held before.
    if session.exists(target).await? {
        return Ok(None);
    }
    let message = banner_text(session).await?.unwrap_or_else(|| {
        "rejected, but the error banner cleared before it could be read".to_string()
    });
    Ok(Some(message))
}

/// Resolves a create-form submission into success or a rejection message.
///
/// `target_pre_existing` must be sampled before submitting. When the target
/// row was already in the list (a duplicate name), its presence cannot signal
/// success, so only the error banner resolves the outcome.
pub(crate) async fn submit_outcome(
    session: &dyn UiSession,
    target: &str,
    target_pre_existing: bool,
    wait: WaitConfig,
    what: &str,
) -> Result<Option<String>, BrowserError> {
    if target_pre_existing {
        wait_for_result(
            || async { Ok(banner_text(session).await?.is_some()) },
            wait,
            what,
        )
        .await?;
        let message = banner_text(session).await?.unwrap_or_else(|| {
            "rejected, but the error banner cleared before it could be read".to_string()
        });
        return Ok(Some(message));
    }

    row_or_error(session, target, wait, what).await
}
