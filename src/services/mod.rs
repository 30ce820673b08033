//! Capability layer
//!
//! Each service handles one facility or one individual and knows nothing about
//! phases, cancellation between facilities, or the final export.

pub mod aggregator;
pub mod detail_collector;
pub mod list_collector;
pub mod roster_parser;

pub use aggregator::aggregate;
pub use detail_collector::DetailCollector;
pub use list_collector::ListCollector;
pub use roster_parser::{parse_roster_entry, WardPolicy};
