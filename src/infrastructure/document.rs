//! Page capabilities used by the collectors
//!
//! The collectors are written against these traits only, so the same code runs
//! over a real Chromium page or a scripted portal in tests.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{QueryResult, SessionError};

/// Structured page query.
///
/// Every call may fail with a [`QueryError`](crate::error::QueryError)
/// carrying a human-readable detail.
#[async_trait]
pub trait DocumentQuery: Send {
    /// Navigates the page. `None` waits for as long as the navigation takes.
    async fn goto(&mut self, url: &str, timeout: Option<Duration>) -> QueryResult<()>;

    /// Waits until the page stops loading resources.
    async fn wait_for_quiescence(&mut self) -> QueryResult<()>;

    /// Text of the first element matching `selector`.
    async fn text(&mut self, selector: &str) -> QueryResult<String>;

    /// Number of elements matching `selector`.
    async fn count(&mut self, selector: &str) -> QueryResult<usize>;

    /// Text of the element at `index` among those matching `selector`.
    async fn nth_text(&mut self, selector: &str, index: usize) -> QueryResult<String>;
}

/// An authenticated page owned by one run.
#[async_trait]
pub trait BrowsingSession: DocumentQuery + Sized {
    /// Releases the page and, when owned, the browser process behind it.
    async fn close(self) -> Result<(), SessionError>;
}

/// Outcome of the login step.
#[derive(Debug)]
pub enum Authentication<S> {
    Authenticated(S),
    /// The operator gave up before logging in
    Abandoned,
}

/// Produces an authenticated session for a run.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: BrowsingSession;

    async fn open(&self) -> Result<Authentication<Self::Session>, SessionError>;
}
