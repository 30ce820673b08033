//! Infrastructure layer
//!
//! Owns the scarce resource (the browser page) and exposes only capabilities:
//! navigation and DOM probes. Nothing here knows about facilities or conduct.

pub mod document;
pub mod js_executor;

pub use document::{Authentication, BrowsingSession, DocumentQuery, SessionProvider};
pub use js_executor::{JsExecutor, PageSnapshot, Probe};
