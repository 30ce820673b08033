//! Worker thread
//!
//! The orchestrator runs end to end on one dedicated OS thread with its own
//! single-threaded runtime, so the browser session is never touched from the
//! presentation thread.

use std::io;
use std::thread::{self, JoinHandle};
use tracing::debug;

use crate::infrastructure::SessionProvider;
use crate::models::FacilityCode;
use crate::orchestrator::collection::{CollectionOrchestrator, RunReport};

pub fn spawn_collection<P>(
    orchestrator: CollectionOrchestrator<P>,
    facilities: Vec<FacilityCode>,
) -> io::Result<JoinHandle<RunReport>>
where
    P: SessionProvider + 'static,
{
    thread::Builder::new()
        .name("conduct-collector".to_string())
        .spawn(move || {
            debug!("Worker thread started");
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();
            match runtime {
                Ok(runtime) => runtime.block_on(orchestrator.run(&facilities)),
                Err(e) => orchestrator.abandon(format!("async runtime unavailable: {}", e)),
            }
        })
}
