//! Error types
//!
//! Each layer owns one error enum. Retrieval errors stay local to a single
//! roster entry or individual; only `SessionError` and `CollectError` can end
//! a run early.

use std::time::Duration;
use thiserror::Error;

/// Failure while reading from a rendered page.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Navigation did not finish or was rejected by the browser
    #[error("navigation to {url} failed: {detail}")]
    Navigation { url: String, detail: String },

    /// A wait exceeded its deadline
    #[error("timed out after {}ms waiting for {what}", .after.as_millis())]
    Timeout { what: String, after: Duration },

    /// No element matched the selector
    #[error("no element matches `{selector}`")]
    MissingElement { selector: String },

    /// The index is past the end of the matched collection
    #[error("index {index} is out of range for `{selector}` ({len} elements)")]
    IndexOutOfRange {
        selector: String,
        index: usize,
        len: usize,
    },

    /// The page script failed or returned something unexpected
    #[error("page script failed: {0}")]
    Script(String),
}

impl From<chromiumoxide::error::CdpError> for QueryError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        QueryError::Script(err.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Script(format!("unexpected probe payload: {}", err))
    }
}

/// A roster block that does not follow the five-line layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected 5 lines in the roster block, found {found}")]
    FieldCount { found: usize },

    #[error("roster code `{raw}` is too short to carry an identifier")]
    EmptyIdentifier { raw: String },
}

/// Why a single roster entry was dropped.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Failure while opening or closing the browsing session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser configuration failed: {0}")]
    Configuration(String),

    #[error("could not launch the browser: {0}")]
    Launch(String),

    #[error("could not connect to the browser on port {port}: {detail}")]
    Connection { port: u16, detail: String },

    #[error("login was rejected: {0}")]
    Rejected(String),

    #[error("login page failed: {0}")]
    Query(#[from] QueryError),

    #[error("browser shutdown failed: {0}")]
    Shutdown(String),
}

/// An error that escapes the phase loops.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("facility {facility}: {source}")]
    Facility {
        facility: String,
        #[source]
        source: QueryError,
    },

    #[error("collection panicked: {0}")]
    Panicked(String),
}

/// Failure while writing the spreadsheet.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: the result has no facilities")]
    Empty,

    #[error("spreadsheet error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("could not prepare {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid configuration file or environment value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment variable {var_name}: value '{value}' is not a valid {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    #[error("no facility selected")]
    NoFacilities,
}

pub type QueryResult<T> = Result<T, QueryError>;
