//! The driver-neutral session abstraction.
//!
//! Page objects are written against the [`UiSession`] trait rather than a
//! concrete browser handle. In CI the trait is backed by headless Chrome; in
//! offline tests it can be backed by an in-memory fake. Because the trait only
//! exposes a small set of DOM primitives, everything above it (navigation
//! flows, assertions, teardown logic) is exercised identically in both modes.
//!
//! # Design Philosophy
//!
//! The trait is intentionally minimal: navigate, query, read, click, type,
//! close. Anything richer (waiting strategies, page-level flows) is built on
//! top of these primitives so that alternative backends stay cheap to write.

use crate::error::Result;
use async_trait::async_trait;

/// One live browsing context (a tab, or an in-memory stand-in for one).
///
/// All selectors are CSS selectors evaluated against the current document.
/// Implementations must be safe to share across tasks; methods take `&self`
/// and serialize access internally where needed.
///
/// # Lifecycle
///
/// A session stays usable until [`close`](UiSession::close) is called. After
/// that, every other method returns [`AlreadyClosed`]. Closing an already
/// closed session is a no-op, which lets teardown paths call it
/// unconditionally.
///
/// [`AlreadyClosed`]: crate::error::BrowserError::AlreadyClosed
#[async_trait]
pub trait UiSession: Send + Sync {
    /// Navigates to an absolute URL and waits for the document to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Returns the URL the session is currently on.
    async fn current_url(&self) -> Result<String>;

    /// Returns true if any element matches the selector.
    async fn exists(&self, selector: &str) -> Result<bool>;

    /// Returns the visible text of the first element matching the selector.
    ///
    /// Fails with `ElementNotFound` if nothing matches.
    async fn read_text(&self, selector: &str) -> Result<String>;

    /// Returns the value of an attribute on the first matching element.
    ///
    /// `Ok(None)` means the element exists but does not carry the attribute.
    /// A missing element is an `ElementNotFound` error.
    async fn read_attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Clicks the first element matching the selector.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Replaces the content of the first matching input with `text`.
    async fn type_text(&self, selector: &str, text: &str) -> Result<()>;

    /// Releases the browsing context. Idempotent.
    async fn close(&self) -> Result<()>;
}

/// Source of fresh [`UiSession`]s.
///
/// Test suites that want one independent session per scenario depend on this
/// trait instead of a concrete browser so the whole suite can run against a
/// fake backend.
///
/// # Example Implementation
///
/// ```ignore
/// struct FakeDriver;
///
/// #[async_trait]
/// impl SessionFactory for FakeDriver {
///     async fn open_session(&self) -> Result<Box<dyn UiSession>> {
///         Ok(Box::new(FakeSession::default()))
///     }
/// }
/// ```
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Opens a new, independent session.
    async fn open_session(&self) -> Result<Box<dyn UiSession>>;
}
