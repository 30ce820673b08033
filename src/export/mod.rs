//! Spreadsheet export: one sheet per facility

pub mod destination;
pub mod workbook;

pub use destination::{suggested_file_name, FixedChooser, PathChooser, PromptChooser};
pub use workbook::{write_workbook, Exporter, ExportOutcome, HEADERS, NOTES_HEADER};
