//! JS executor - infrastructure layer
//!
//! Holds the only page handle and exposes "evaluate JS" plus the DOM probes
//! built on top of it.

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{QueryError, QueryResult};

/// Result of probing a selector at one index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Probe {
    /// Number of elements matching the selector
    pub len: usize,
    /// `textContent` of the element at the probed index, if it exists
    pub text: Option<String>,
}

/// Loading state used to decide when a page has settled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageSnapshot {
    pub ready: String,
    pub resources: usize,
}

impl PageSnapshot {
    pub fn is_complete(&self) -> bool {
        self.ready == "complete"
    }
}

/// JS executor
///
/// - owns the single `Page`
/// - knows selectors, never facilities or individuals
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    /// Evaluates an expression that returns `JSON.stringify(...)` and decodes it.
    ///
    /// Going through a string keeps `null` and `undefined` distinguishable from
    /// a missing result.
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> QueryResult<T> {
        let result = self.page.evaluate(js_code.into()).await?;
        let raw: String = result.into_value()?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn navigate(&self, url: &str) -> QueryResult<()> {
        self.page
            .goto(url)
            .await
            .map(|_| ())
            .map_err(|e| QueryError::Navigation {
                url: url.to_string(),
                detail: e.to_string(),
            })
    }

    pub async fn probe(&self, selector: &str, index: usize) -> QueryResult<Probe> {
        self.eval_as(probe_script(selector, index)?).await
    }

    pub async fn snapshot(&self) -> QueryResult<PageSnapshot> {
        self.eval_as(
            r#"JSON.stringify({
                ready: document.readyState,
                resources: performance.getEntriesByType('resource').length
            })"#,
        )
        .await
    }

    /// Sets the value of an input and fires the events forms listen to.
    pub async fn fill(&self, selector: &str, value: &str) -> QueryResult<bool> {
        let js_code = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return JSON.stringify(false);
                el.focus();
                el.value = {};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return JSON.stringify(true);
            }})()"#,
            serde_json::to_string(selector)?,
            serde_json::to_string(value)?
        );
        self.eval_as(js_code).await
    }

    pub async fn click(&self, selector: &str) -> QueryResult<bool> {
        let js_code = format!(
            r#"(() => {{
                const el = document.querySelector({});
                if (!el) return JSON.stringify(false);
                el.click();
                return JSON.stringify(true);
            }})()"#,
            serde_json::to_string(selector)?
        );
        self.eval_as(js_code).await
    }
}

fn probe_script(selector: &str, index: usize) -> QueryResult<String> {
    Ok(format!(
        r#"(() => {{
            const nodes = document.querySelectorAll({});
            const idx = {};
            return JSON.stringify({{
                len: nodes.length,
                text: idx < nodes.length ? nodes[idx].textContent : null
            }});
        }})()"#,
        serde_json::to_string(selector)?,
        index
    ))
}
