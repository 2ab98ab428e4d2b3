//! An in-memory stand-in for the FnDeck console.
//!
//! `SimConsole` models the console's observable behavior: the home page with
//! its app list, per-app details pages with function rows, the create forms,
//! the function editor, and the error banner. Sessions opened from it speak
//! the same selector contract as the real markup, so page objects and whole
//! suites run against it unchanged and without a browser.
//!
//! The model is deliberately strict where the console is strict: names must
//! be unique, functions need an image, memory must be inside the accepted
//! range, and a rejected edit leaves the function exactly as it was.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use fndeck_browser_test::{BrowserError, Result as BrowserResult, SessionFactory, UiSession};

use crate::pages::selectors;

/// Smallest memory allocation the console accepts, in MB.
pub const MIN_FN_MEMORY_MB: u64 = 64;

/// Largest memory allocation the console accepts, in MB.
pub const MAX_FN_MEMORY_MB: u64 = 8192;

#[derive(Debug, Clone)]
struct FnRecord {
    image: String,
    memory: Option<u64>,
}

#[derive(Debug, Default)]
struct ConsoleState {
    apps: BTreeMap<String, BTreeMap<String, FnRecord>>,
}

/// The simulated console. Cloning yields another handle to the same state.
///
/// Implements [`SessionFactory`], so anything that takes a factory (the page
/// objects, the suite runner) accepts a `SimConsole` in place of a real
/// browser. Inspection methods let tests assert on server-side state that the
/// UI alone cannot prove, like memory values.
#[derive(Debug, Clone)]
pub struct SimConsole {
    state: Arc<Mutex<ConsoleState>>,
    base_url: String,
    open_sessions: Arc<AtomicUsize>,
}

impl SimConsole {
    /// Creates an empty console reachable at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConsoleState::default())),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            open_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The URL the console pretends to serve.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates an app directly, bypassing the UI. Test setup helper.
    pub fn seed_app(&self, name: &str) {
        lock(&self.state).apps.entry(name.to_string()).or_default();
    }

    /// Returns true if an app with this name exists.
    pub fn has_app(&self, name: &str) -> bool {
        lock(&self.state).apps.contains_key(name)
    }

    /// Returns all app names, sorted.
    pub fn app_names(&self) -> Vec<String> {
        lock(&self.state).apps.keys().cloned().collect()
    }

    /// Returns a function's image, if the app and function exist.
    pub fn fn_image(&self, app: &str, fn_name: &str) -> Option<String> {
        lock(&self.state)
            .apps
            .get(app)
            .and_then(|fns| fns.get(fn_name))
            .map(|record| record.image.clone())
    }

    /// Returns a function's memory allocation, if one was ever applied.
    pub fn fn_memory(&self, app: &str, fn_name: &str) -> Option<u64> {
        lock(&self.state)
            .apps
            .get(app)
            .and_then(|fns| fns.get(fn_name))
            .and_then(|record| record.memory)
    }

    /// Number of sessions opened and not yet closed.
    ///
    /// Suites that release every session on every path leave this at zero.
    pub fn open_session_count(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for SimConsole {
    async fn open_session(&self) -> BrowserResult<Box<dyn UiSession>> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SimSession {
            console: self.state.clone(),
            base_url: self.base_url.clone(),
            open_sessions: self.open_sessions.clone(),
            page: Mutex::new(PageState::new()),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Route {
    #[default]
    Blank,
    Home,
    App(String),
    Unknown,
}

#[derive(Debug)]
struct PageState {
    url: String,
    route: Route,
    /// Typed-but-not-submitted input values, keyed by selector.
    fields: BTreeMap<String, String>,
    banner: Option<String>,
    /// Name of the function whose editor is open, if any.
    editing: Option<String>,
    closed: bool,
}

impl PageState {
    fn new() -> Self {
        Self {
            url: "about:blank".to_string(),
            route: Route::Blank,
            fields: BTreeMap::new(),
            banner: None,
            editing: None,
            closed: false,
        }
    }

    /// Page-load semantics: a navigation drops transient UI state.
    fn load(&mut self, url: String, route: Route) {
        self.url = url;
        self.route = route;
        self.fields.clear();
        self.banner = None;
        self.editing = None;
    }

    fn field(&self, selector: &str) -> String {
        self.fields.get(selector).cloned().unwrap_or_default()
    }
}

/// One simulated browsing context.
struct SimSession {
    console: Arc<Mutex<ConsoleState>>,
    base_url: String,
    open_sessions: Arc<AtomicUsize>,
    page: Mutex<PageState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned lock only means another test thread panicked; the state
    // itself stays usable.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SimSession {
    fn parse_route(&self, url: &str) -> Route {
        let trimmed = url.trim_end_matches('/');
        if trimmed == self.base_url {
            return Route::Home;
        }
        if let Some(rest) = trimmed.strip_prefix(&self.base_url) {
            if let Some(name) = rest.strip_prefix("/app/") {
                if !name.is_empty() && !name.contains('/') {
                    return Route::App(name.to_string());
                }
            }
        }
        Route::Unknown
    }

    fn ensure_open(page: &PageState) -> BrowserResult<()> {
        if page.closed {
            Err(BrowserError::AlreadyClosed)
        } else {
            Ok(())
        }
    }

    /// Whether `selector` currently matches an element.
    fn element_exists(page: &PageState, state: &ConsoleState, selector: &str) -> bool {
        match &page.route {
            Route::Blank | Route::Unknown => false,
            Route::Home => {
                if matches!(
                    selector,
                    selectors::APP_LIST | selectors::APP_NAME_INPUT | selectors::CREATE_APP_SUBMIT
                ) {
                    return true;
                }
                if selector == selectors::ERROR_BANNER {
                    return page.banner.is_some();
                }
                state.apps.keys().any(|name| {
                    selector == selectors::app_link(name)
                        || selector == selectors::app_delete_button(name)
                })
            }
            Route::App(app_name) => {
                let Some(fns) = state.apps.get(app_name) else {
                    // Unknown app: the console renders nothing the harness
                    // looks for.
                    return false;
                };
                if matches!(
                    selector,
                    selectors::FN_LIST
                        | selectors::APP_TITLE
                        | selectors::FN_NAME_INPUT
                        | selectors::FN_IMAGE_INPUT
                        | selectors::FN_MEMORY_INPUT
                        | selectors::CREATE_FN_SUBMIT
                ) {
                    return true;
                }
                if matches!(
                    selector,
                    selectors::FN_EDITOR
                        | selectors::EDIT_IMAGE_INPUT
                        | selectors::EDIT_MEMORY_INPUT
                        | selectors::EDIT_FN_SUBMIT
                ) {
                    return page.editing.is_some();
                }
                if selector == selectors::ERROR_BANNER {
                    return page.banner.is_some();
                }
                fns.keys().any(|name| {
                    selector == selectors::fn_row(name)
                        || selector == selectors::fn_image_cell(name)
                        || selector == selectors::fn_edit_button(name)
                        || selector == selectors::fn_delete_button(name)
                })
            }
        }
    }

    /// Text content of the element, or None if it doesn't exist.
    fn element_text(page: &PageState, state: &ConsoleState, selector: &str) -> Option<String> {
        if !Self::element_exists(page, state, selector) {
            return None;
        }

        if selector == selectors::ERROR_BANNER {
            return page.banner.clone();
        }

        if let Route::App(app_name) = &page.route {
            if selector == selectors::APP_TITLE {
                return Some(app_name.clone());
            }
            if let Some(fns) = state.apps.get(app_name) {
                for (name, record) in fns {
                    if selector == selectors::fn_row(name) {
                        return Some(name.clone());
                    }
                    if selector == selectors::fn_image_cell(name) {
                        return Some(record.image.clone());
                    }
                }
            }
        }

        Some(String::new())
    }

    fn do_click(
        &self,
        page: &mut PageState,
        state: &mut ConsoleState,
        selector: &str,
    ) -> BrowserResult<()> {
        if !Self::element_exists(page, state, selector) {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            });
        }

        match page.route.clone() {
            Route::Home => self.click_on_home(page, state, selector),
            Route::App(app_name) => Self::click_on_app(page, state, &app_name, selector),
            // Blank and Unknown routes have no elements, caught above.
            Route::Blank | Route::Unknown => {}
        }

        Ok(())
    }

    fn click_on_home(&self, page: &mut PageState, state: &mut ConsoleState, selector: &str) {
        if selector == selectors::CREATE_APP_SUBMIT {
            let name = page.field(selectors::APP_NAME_INPUT).trim().to_string();
            page.banner = None;

            if name.is_empty() {
                page.banner = Some("app name required".to_string());
            } else if state.apps.contains_key(&name) {
                page.banner = Some(format!("app '{name}' already exists"));
            } else {
                state.apps.insert(name, BTreeMap::new());
                page.fields.remove(selectors::APP_NAME_INPUT);
            }
            return;
        }

        for name in state.apps.keys().cloned().collect::<Vec<_>>() {
            if selector == selectors::app_link(&name) {
                let url = format!("{}/app/{name}", self.base_url);
                page.load(url, Route::App(name));
                return;
            }
            if selector == selectors::app_delete_button(&name) {
                state.apps.remove(&name);
                page.banner = None;
                return;
            }
        }
    }

    fn click_on_app(
        page: &mut PageState,
        state: &mut ConsoleState,
        app_name: &str,
        selector: &str,
    ) {
        let Some(fns) = state.apps.get_mut(app_name) else {
            return;
        };

        if selector == selectors::CREATE_FN_SUBMIT {
            let name = page.field(selectors::FN_NAME_INPUT).trim().to_string();
            let image = page.field(selectors::FN_IMAGE_INPUT).trim().to_string();
            let memory_text = page.field(selectors::FN_MEMORY_INPUT).trim().to_string();
            page.banner = None;

            if name.is_empty() {
                page.banner = Some("function name required".to_string());
                return;
            }
            if fns.contains_key(&name) {
                page.banner = Some(format!("function '{name}' already exists"));
                return;
            }
            if image.is_empty() {
                page.banner = Some("image required".to_string());
                return;
            }
            let memory = if memory_text.is_empty() {
                None
            } else {
                match validate_memory(&memory_text) {
                    Ok(value) => Some(value),
                    Err(message) => {
                        page.banner = Some(message);
                        return;
                    }
                }
            };

            fns.insert(name, FnRecord { image, memory });
            page.fields.remove(selectors::FN_NAME_INPUT);
            page.fields.remove(selectors::FN_IMAGE_INPUT);
            page.fields.remove(selectors::FN_MEMORY_INPUT);
            return;
        }

        if selector == selectors::EDIT_FN_SUBMIT {
            let Some(editing) = page.editing.clone() else {
                return;
            };
            let image = page.field(selectors::EDIT_IMAGE_INPUT).trim().to_string();
            let memory_text = page.field(selectors::EDIT_MEMORY_INPUT).trim().to_string();
            page.banner = None;

            if image.is_empty() {
                page.banner = Some("image required".to_string());
                return;
            }
            // Validate everything before touching the record; a rejected
            // edit must not apply partially.
            let memory = if memory_text.is_empty() {
                None
            } else {
                match validate_memory(&memory_text) {
                    Ok(value) => Some(value),
                    Err(message) => {
                        page.banner = Some(message);
                        return;
                    }
                }
            };

            if let Some(record) = fns.get_mut(&editing) {
                record.image = image;
                record.memory = memory;
            }
            page.editing = None;
            page.fields.remove(selectors::EDIT_IMAGE_INPUT);
            page.fields.remove(selectors::EDIT_MEMORY_INPUT);
            return;
        }

        for name in fns.keys().cloned().collect::<Vec<_>>() {
            if selector == selectors::fn_edit_button(&name) {
                // Opening the editor prefills it with the current values.
                let record = &fns[&name];
                page.fields
                    .insert(selectors::EDIT_IMAGE_INPUT.to_string(), record.image.clone());
                page.fields.insert(
                    selectors::EDIT_MEMORY_INPUT.to_string(),
                    record.memory.map(|m| m.to_string()).unwrap_or_default(),
                );
                page.editing = Some(name);
                page.banner = None;
                return;
            }
            if selector == selectors::fn_delete_button(&name) {
                fns.remove(&name);
                if page.editing.as_deref() == Some(name.as_str()) {
                    page.editing = None;
                }
                page.banner = None;
                return;
            }
        }
    }
}

fn validate_memory(text: &str) -> std::result::Result<u64, String> {
    let value: u64 = text
        .parse()
        .map_err(|_| format!("memory must be a whole number of MB, got '{text}'"))?;
    if !(MIN_FN_MEMORY_MB..=MAX_FN_MEMORY_MB).contains(&value) {
        return Err(format!(
            "memory value out of range: must be between {MIN_FN_MEMORY_MB} and {MAX_FN_MEMORY_MB} MB"
        ));
    }
    Ok(value)
}

#[async_trait]
impl UiSession for SimSession {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        let mut page = lock(&self.page);
        Self::ensure_open(&page)?;

        let route = self.parse_route(url);
        page.load(url.to_string(), route);
        Ok(())
    }

    async fn current_url(&self) -> BrowserResult<String> {
        let page = lock(&self.page);
        Self::ensure_open(&page)?;
        Ok(page.url.clone())
    }

    async fn exists(&self, selector: &str) -> BrowserResult<bool> {
        let page = lock(&self.page);
        Self::ensure_open(&page)?;
        let state = lock(&self.console);
        Ok(Self::element_exists(&page, &state, selector))
    }

    async fn read_text(&self, selector: &str) -> BrowserResult<String> {
        let page = lock(&self.page);
        Self::ensure_open(&page)?;
        let state = lock(&self.console);
        Self::element_text(&page, &state, selector).ok_or_else(|| BrowserError::ElementNotFound {
            selector: selector.to_string(),
        })
    }

    async fn read_attribute(&self, selector: &str, name: &str) -> BrowserResult<Option<String>> {
        let page = lock(&self.page);
        Self::ensure_open(&page)?;
        let state = lock(&self.console);

        if !Self::element_exists(&page, &state, selector) {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            });
        }

        // Inputs expose their current value; nothing else carries attributes
        // the harness reads.
        let is_input = matches!(
            selector,
            selectors::APP_NAME_INPUT
                | selectors::FN_NAME_INPUT
                | selectors::FN_IMAGE_INPUT
                | selectors::FN_MEMORY_INPUT
                | selectors::EDIT_IMAGE_INPUT
                | selectors::EDIT_MEMORY_INPUT
        );
        if is_input && name == "value" {
            return Ok(Some(page.field(selector)));
        }
        Ok(None)
    }

    async fn click(&self, selector: &str) -> BrowserResult<()> {
        let mut page = lock(&self.page);
        Self::ensure_open(&page)?;
        let mut state = lock(&self.console);
        self.do_click(&mut page, &mut state, selector)
    }

    async fn type_text(&self, selector: &str, text: &str) -> BrowserResult<()> {
        let mut page = lock(&self.page);
        Self::ensure_open(&page)?;
        let state = lock(&self.console);

        if !Self::element_exists(&page, &state, selector) {
            return Err(BrowserError::ElementNotFound {
                selector: selector.to_string(),
            });
        }
        page.fields.insert(selector.to_string(), text.to_string());
        Ok(())
    }

    async fn close(&self) -> BrowserResult<()> {
        let mut page = lock(&self.page);
        if !page.closed {
            page.closed = true;
            self.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
