//! Two-phase collection orchestrator - orchestration layer
//!
//! ## Responsibilities
//!
//! 1. **Session ownership**: opens the session at run start and closes it on
//!    every exit path once it exists
//! 2. **Phase 1**: lists the roster of every selected facility
//! 3. **Phase 2**: only then fetches the conduct of every listed individual
//! 4. **Cancellation**: polls the token at each checkpoint
//! 5. **Isolation**: entry and individual failures stay local; anything that
//!    escapes the phase loops is reported once and the partial result kept
//!
//! Cancelled while listing, the facilities listed so far are kept with empty
//! record lists and the rest are left out. Cancelled while fetching details,
//! the facility in progress keeps the records read so far and the facilities
//! not yet started are left out.
//!
//! Phase 2 could also run right after each facility's listing. Both orders
//! produce the same result; listing everything first keeps the progress
//! messages grouped by phase.

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::CollectError;
use crate::infrastructure::{Authentication, BrowsingSession, DocumentQuery, SessionProvider};
use crate::models::{CollectionResult, ConductRecord, FacilityCode, RecordStub};
use crate::orchestrator::state::RunState;
use crate::progress::{Progress, ProgressSink};
use crate::services::{aggregate, DetailCollector, ListCollector};

type FacilityRecords = Vec<(FacilityCode, Vec<ConductRecord>)>;

/// How the phase loops ended when nothing escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseEnd {
    Finished,
    Cancelled,
}

/// Outcome of one run, returned through the worker's join handle.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub result: CollectionResult,
    pub elapsed: Duration,
}

pub struct CollectionOrchestrator<P> {
    provider: P,
    list_collector: ListCollector,
    detail_collector: DetailCollector,
    progress: ProgressSink,
    cancel: CancellationToken,
    state: RunState,
}

impl<P: SessionProvider> CollectionOrchestrator<P> {
    pub fn new(config: &Config, provider: P, progress: ProgressSink, cancel: CancellationToken) -> Self {
        Self {
            provider,
            list_collector: ListCollector::new(config),
            detail_collector: DetailCollector::new(config),
            progress,
            cancel,
            state: RunState::Idle,
        }
    }

    /// Runs the whole collection for `facilities`, in the given order.
    ///
    /// Always sets the cancellation token before returning so observers can
    /// tell the run is over.
    pub async fn run(mut self, facilities: &[FacilityCode]) -> RunReport {
        let started = Instant::now();
        info!("{}", "=".repeat(60));
        info!("🚀 Collection started for {} facilities", facilities.len());
        info!("{}", "=".repeat(60));

        let result = self.drive(facilities).await;
        self.cancel.cancel();

        let elapsed = started.elapsed();
        info!(
            "Run ended in state '{}' after {:.1}s",
            self.state,
            elapsed.as_secs_f64()
        );
        RunReport {
            state: self.state,
            result,
            elapsed,
        }
    }

    /// Ends a run that could not be started at all.
    pub fn abandon(mut self, reason: impl std::fmt::Display) -> RunReport {
        error!("Collection could not start: {}", reason);
        self.progress
            .status(format!("Collection could not start: {}", reason));
        self.transition_to(RunState::Aborted);
        self.cancel.cancel();
        RunReport {
            state: self.state,
            result: CollectionResult::new(),
            elapsed: Duration::ZERO,
        }
    }

    async fn drive(&mut self, facilities: &[FacilityCode]) -> CollectionResult {
        if self.cancel.is_cancelled() {
            self.transition_to(RunState::Aborted);
            return self.finish(Vec::new(), "Collection cancelled before it started.");
        }

        self.transition_to(RunState::Authenticating);
        let mut session = match self.provider.open().await {
            Ok(Authentication::Authenticated(session)) => session,
            Ok(Authentication::Abandoned) => {
                self.fail("Login abandoned, collection cancelled.");
                return CollectionResult::new();
            }
            Err(e) => {
                self.fail(&format!("Login failed: {}", e));
                return CollectionResult::new();
            }
        };

        let mut collected: FacilityRecords = Vec::new();
        let outcome = AssertUnwindSafe(self.collect_phases(&mut session, facilities, &mut collected))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            warn!("Browser shutdown failed: {}", e);
            self.progress.status(format!("Error closing the browser: {}", e));
        } else {
            debug!("Session closed");
        }

        let escaped = match outcome {
            Ok(Ok(PhaseEnd::Finished)) => None,
            Ok(Ok(PhaseEnd::Cancelled)) => {
                self.transition_to(RunState::Aborted);
                return self.finish(collected, "Collection cancelled, partial results kept.");
            }
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(CollectError::Panicked(panic_message(payload.as_ref()))),
        };

        let closing = match escaped {
            None => "Collection finished!".to_string(),
            Some(e) => {
                error!("Collection error: {}", e);
                format!("Collection error: {}", e)
            }
        };
        self.transition_to(RunState::Aggregating);
        let result = self.finish(collected, &closing);
        self.transition_to(RunState::Done);
        result
    }

    async fn collect_phases<S: DocumentQuery>(
        &mut self,
        session: &mut S,
        facilities: &[FacilityCode],
        collected: &mut FacilityRecords,
    ) -> Result<PhaseEnd, CollectError> {
        // ========== Phase 1: rosters ==========
        self.transition_to(RunState::ListingFacilities);
        let mut rosters: Vec<(FacilityCode, Vec<RecordStub>)> = Vec::with_capacity(facilities.len());
        for facility in facilities {
            if self.cancel.is_cancelled() {
                break;
            }
            let stubs = self
                .list_collector
                .collect(session, facility, &self.progress, &self.cancel)
                .await
                .map_err(|source| CollectError::Facility {
                    facility: facility.to_string(),
                    source,
                })?;
            rosters.push((facility.clone(), stubs));
        }
        if self.cancel.is_cancelled() {
            // listed facilities stay as keys; none of their conduct was read
            collected.extend(rosters.into_iter().map(|(facility, _)| (facility, Vec::new())));
            return Ok(PhaseEnd::Cancelled);
        }

        // ========== Phase 2: conduct ==========
        self.transition_to(RunState::CollectingDetails);
        for (facility, stubs) in &rosters {
            if self.cancel.is_cancelled() {
                return Ok(PhaseEnd::Cancelled);
            }
            self.progress
                .status(format!("Collecting conduct for facility {}...", facility));

            collected.push((facility.clone(), Vec::with_capacity(stubs.len())));
            let slot = collected.len() - 1;
            for (index, stub) in stubs.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    return Ok(PhaseEnd::Cancelled);
                }
                let remaining = stubs.len() - (index + 1);
                let record = self
                    .detail_collector
                    .collect(session, stub, remaining, &self.progress)
                    .await;
                collected[slot].1.push(record);
            }

            self.progress.status(format!(
                "Conduct collected for every individual of facility {}.",
                facility
            ));
        }

        Ok(PhaseEnd::Finished)
    }

    /// Aggregates, reports the closing line and emits the result.
    fn finish(&mut self, collected: FacilityRecords, closing: &str) -> CollectionResult {
        let result = aggregate(collected);
        self.progress.status(format!(
            "{} {} records from {} facilities.",
            closing,
            result.record_count(),
            result.facilities().len()
        ));
        self.progress.push(Progress::Completed(result.clone()));
        result
    }

    fn fail(&mut self, detail: &str) {
        error!("{}", detail);
        self.transition_to(RunState::Failed);
        self.progress
            .push(Progress::AuthenticationFailed(detail.to_string()));
    }

    fn transition_to(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run transition {} -> {}",
            self.state,
            next
        );
        debug!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
