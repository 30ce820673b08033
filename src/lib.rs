//! # Conduct Roster
//!
//! Collects the roster of selected detention facilities from the portal, then
//! the conduct classification of every listed individual, and saves the
//! result as a workbook with one sheet per facility.
//!
//! ## Layers
//!
//! ### ① Infrastructure
//! - `infrastructure/` - page capabilities (`DocumentQuery`, `SessionProvider`)
//! - `JsExecutor` - the only owner of the Chromium page
//! - `browser/` - launching, connecting and logging in
//!
//! ### ② Services
//! - `ListCollector` - one facility roster
//! - `DetailCollector` - one individual's conduct
//! - `aggregate` - folds per-facility lists into the result
//!
//! ### ③ Orchestration
//! - `orchestrator/collection` - two phases, checkpoints, guaranteed cleanup
//! - `orchestrator/worker` - the dedicated worker thread
//!
//! ### ④ Presentation
//! - `app` - progress polling, Ctrl-C, export prompt
//! - `export/` - `.xlsx` writing and the save prompt

pub mod app;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod services;
pub mod utils;

pub use app::App;
pub use config::Config;
pub use error::{CollectError, ConfigError, ExportError, QueryError, SessionError};
pub use infrastructure::{Authentication, BrowsingSession, DocumentQuery, SessionProvider};
pub use models::{CollectionResult, ConductRecord, FacilityCode, RecordStub};
pub use orchestrator::{spawn_collection, CollectionOrchestrator, RunReport, RunState};
pub use progress::{Progress, ProgressSink, ProgressStream};
