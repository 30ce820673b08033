use async_trait::async_trait;
use chromiumoxide::Browser;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{QueryError, QueryResult, SessionError};
use crate::infrastructure::{BrowsingSession, DocumentQuery, JsExecutor};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// No new network resources for this long counts as quiescent
const IDLE_WINDOW: Duration = Duration::from_millis(500);

/// A logged-in Chromium page owned by the worker for one run.
pub struct ChromeSession {
    browser: Browser,
    executor: JsExecutor,
    events: JoinHandle<()>,
    /// `false` when attached to the operator's own browser
    owns_browser: bool,
    element_timeout: Option<Duration>,
    quiescence_timeout: Option<Duration>,
}

impl ChromeSession {
    pub fn new(
        browser: Browser,
        executor: JsExecutor,
        events: JoinHandle<()>,
        owns_browser: bool,
    ) -> Self {
        Self {
            browser,
            executor,
            events,
            owns_browser,
            element_timeout: None,
            quiescence_timeout: None,
        }
    }

    pub fn with_timeouts(
        mut self,
        element_timeout: Option<Duration>,
        quiescence_timeout: Option<Duration>,
    ) -> Self {
        self.element_timeout = element_timeout;
        self.quiescence_timeout = quiescence_timeout;
        self
    }

    pub fn executor(&self) -> &JsExecutor {
        &self.executor
    }
}

#[async_trait]
impl DocumentQuery for ChromeSession {
    async fn goto(&mut self, url: &str, timeout: Option<Duration>) -> QueryResult<()> {
        debug!("Navigating to {}", url);
        with_deadline(timeout, url, self.executor.navigate(url)).await
    }

    async fn wait_for_quiescence(&mut self) -> QueryResult<()> {
        let executor = &self.executor;
        let settle = async {
            let mut last_resources: Option<usize> = None;
            let mut stable_since = Instant::now();
            loop {
                let snapshot = executor.snapshot().await?;
                if snapshot.is_complete() && last_resources == Some(snapshot.resources) {
                    if stable_since.elapsed() >= IDLE_WINDOW {
                        return Ok(());
                    }
                } else {
                    stable_since = Instant::now();
                }
                last_resources = Some(snapshot.resources);
                sleep(POLL_INTERVAL).await;
            }
        };
        with_deadline(self.quiescence_timeout, "network quiescence", settle).await
    }

    async fn text(&mut self, selector: &str) -> QueryResult<String> {
        let executor = &self.executor;
        let appear = async {
            loop {
                if let Some(text) = executor.probe(selector, 0).await?.text {
                    return Ok(text);
                }
                sleep(POLL_INTERVAL).await;
            }
        };
        with_deadline(self.element_timeout, selector, appear).await
    }

    async fn count(&mut self, selector: &str) -> QueryResult<usize> {
        Ok(self.executor.probe(selector, 0).await?.len)
    }

    async fn nth_text(&mut self, selector: &str, index: usize) -> QueryResult<String> {
        let probe = self.executor.probe(selector, index).await?;
        match probe.text {
            Some(text) => Ok(text),
            None if probe.len == 0 => Err(QueryError::MissingElement {
                selector: selector.to_string(),
            }),
            None => Err(QueryError::IndexOutOfRange {
                selector: selector.to_string(),
                index,
                len: probe.len,
            }),
        }
    }
}

#[async_trait]
impl BrowsingSession for ChromeSession {
    async fn close(mut self) -> Result<(), SessionError> {
        let result = if self.owns_browser {
            match self.browser.close().await {
                Ok(_) => {
                    if let Err(e) = self.browser.wait().await {
                        warn!("Browser process did not exit cleanly: {}", e);
                    }
                    Ok(())
                }
                Err(e) => Err(SessionError::Shutdown(e.to_string())),
            }
        } else {
            self.executor
                .into_page()
                .close()
                .await
                .map_err(|e| SessionError::Shutdown(e.to_string()))
        };
        self.events.abort();
        result
    }
}

async fn with_deadline<T, F>(limit: Option<Duration>, what: &str, fut: F) -> QueryResult<T>
where
    F: Future<Output = QueryResult<T>>,
{
    match limit {
        None => fut.await,
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .unwrap_or_else(|_| {
                Err(QueryError::Timeout {
                    what: what.to_string(),
                    after,
                })
            }),
    }
}
