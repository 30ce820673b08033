//! Conduct lookup - capability layer
//!
//! Reads one individual's certificate page. Never fails: an unreadable page
//! becomes an `UNAVAILABLE` record carrying the error detail.

use std::time::Duration;
use tracing::warn;

use crate::config::Config;
use crate::error::QueryResult;
use crate::infrastructure::DocumentQuery;
use crate::models::{ConductRecord, RecordStub};
use crate::progress::ProgressSink;

pub struct DetailCollector {
    detail_url: String,
    conduct_selector: String,
    navigation_timeout: Option<Duration>,
}

impl DetailCollector {
    pub fn new(config: &Config) -> Self {
        Self {
            detail_url: config.detail_url.clone(),
            conduct_selector: config.conduct_selector.clone(),
            navigation_timeout: config.detail_navigation_timeout(),
        }
    }

    pub fn detail_url(&self, stub: &RecordStub) -> String {
        format!("{}{}", self.detail_url, stub.id)
    }

    /// Resolves the conduct of `stub` and reports it.
    ///
    /// `remaining` is the number of individuals of the facility still to be
    /// processed after this one.
    pub async fn collect<Q: DocumentQuery>(
        &self,
        page: &mut Q,
        stub: &RecordStub,
        remaining: usize,
        progress: &ProgressSink,
    ) -> ConductRecord {
        let record = match self.read_conduct(page, stub).await {
            Ok(conduct) => ConductRecord::found(stub, conduct),
            Err(e) => {
                warn!("Conduct of {} (code {}) unavailable: {}", stub.name, stub.id, e);
                ConductRecord::unavailable(stub, e.to_string())
            }
        };

        progress.status(format!(
            "{} - {}, conduct {}, {} remaining",
            record.id, record.name, record.conduct, remaining
        ));
        record
    }

    async fn read_conduct<Q: DocumentQuery>(&self, page: &mut Q, stub: &RecordStub) -> QueryResult<String> {
        page.goto(&self.detail_url(stub), self.navigation_timeout)
            .await?;
        page.wait_for_quiescence().await?;
        let conduct = page.text(&self.conduct_selector).await?;
        Ok(conduct.trim().to_string())
    }
}
