//! Roster collection - capability layer
//!
//! Lists the individuals of one facility. A bad entry is reported and dropped;
//! only a failed navigation or count ends the facility.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{EntryError, QueryResult};
use crate::infrastructure::DocumentQuery;
use crate::models::{FacilityCode, RecordStub};
use crate::progress::ProgressSink;
use crate::services::roster_parser::{parse_roster_entry, WardPolicy};

pub struct ListCollector {
    roster_url: String,
    entry_selector: String,
    name_selector: String,
    navigation_timeout: Option<Duration>,
    ward_policy: WardPolicy,
}

impl ListCollector {
    pub fn new(config: &Config) -> Self {
        Self {
            roster_url: config.roster_url.clone(),
            entry_selector: config.roster_entry_selector.clone(),
            name_selector: config.roster_name_selector.clone(),
            navigation_timeout: config.roster_navigation_timeout(),
            ward_policy: config.ward_policy,
        }
    }

    pub fn roster_url(&self, facility: &FacilityCode) -> String {
        format!("{}{}", self.roster_url, facility)
    }

    /// Collects the stubs of one facility in roster order.
    ///
    /// Stops early, keeping what was read, when `cancel` is set between entries.
    pub async fn collect<Q: DocumentQuery>(
        &self,
        page: &mut Q,
        facility: &FacilityCode,
        progress: &ProgressSink,
        cancel: &CancellationToken,
    ) -> QueryResult<Vec<RecordStub>> {
        progress.status(format!(
            "Navigating to facility {} to collect the roster...",
            facility
        ));
        page.goto(&self.roster_url(facility), self.navigation_timeout)
            .await?;
        page.wait_for_quiescence().await?;

        let total = page.count(&self.entry_selector).await?;
        debug!("Facility {}: {} roster entries", facility, total);

        let mut stubs = Vec::with_capacity(total);
        for index in 0..total {
            if cancel.is_cancelled() {
                info!(
                    "Facility {}: roster stopped at entry {}/{}",
                    facility, index, total
                );
                break;
            }
            match self.read_entry(page, index).await {
                Ok(stub) => stubs.push(stub),
                Err(e) => progress.status(format!(
                    "Error collecting the roster of facility {}, index {}: {}",
                    facility, index, e
                )),
            }
        }

        progress.status(format!(
            "Roster of {} individuals collected for facility {}.",
            stubs.len(),
            facility
        ));
        Ok(stubs)
    }

    async fn read_entry<Q: DocumentQuery>(
        &self,
        page: &mut Q,
        index: usize,
    ) -> Result<RecordStub, EntryError> {
        let block = page.nth_text(&self.entry_selector, index).await?;
        let name = page.nth_text(&self.name_selector, index).await?;
        Ok(parse_roster_entry(&block, &name, self.ward_policy)?)
    }
}
