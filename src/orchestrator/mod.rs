//! Orchestration layer
//!
//! ```text
//! worker (dedicated thread + runtime)
//!     ↓
//! collection::CollectionOrchestrator (phases, checkpoints, cleanup)
//!     ↓
//! services (ListCollector / DetailCollector / aggregate)
//!     ↓
//! infrastructure (DocumentQuery / SessionProvider)
//! ```
//!
//! Only this layer holds the session, and only for the duration of one run.

pub mod collection;
pub mod state;
pub mod worker;

pub use collection::{CollectionOrchestrator, RunReport};
pub use state::RunState;
pub use worker::spawn_collection;
