use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ExportError;
use crate::export::destination::PathChooser;
use crate::models::{CollectionResult, FacilityResult};

pub const HEADERS: [&str; 4] = ["Code", "Ward", "Name", "Conduct"];
pub const NOTES_HEADER: &str = "Obs.";

/// Excel sheet names: at most 31 characters, none of `[]:*?/\`.
const SHEET_NAME_MAX: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Cancelled,
}

/// Asks where to save, then writes the workbook there.
pub struct Exporter {
    output_dir: PathBuf,
    include_notes: bool,
}

impl Exporter {
    pub fn new(config: &Config) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output_dir),
            include_notes: config.include_notes,
        }
    }

    pub fn suggested_path(&self) -> PathBuf {
        self.output_dir
            .join(super::suggested_file_name(chrono::Local::now().date_naive()))
    }

    pub fn export(
        &self,
        result: &CollectionResult,
        chooser: &mut dyn PathChooser,
    ) -> Result<ExportOutcome, ExportError> {
        if result.is_empty() {
            return Err(ExportError::Empty);
        }
        let Some(path) = chooser.choose(&self.suggested_path()) else {
            warn!("Export cancelled by the operator");
            return Ok(ExportOutcome::Cancelled);
        };

        write_workbook(result, &path, self.include_notes)?;
        info!("✓ Workbook saved: {}", path.display());
        Ok(ExportOutcome::Saved(path))
    }
}

/// Writes `result` to `path` as `.xlsx`, creating parent directories.
pub fn write_workbook(
    result: &CollectionResult,
    path: &Path,
    include_notes: bool,
) -> Result<(), ExportError> {
    if result.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let mut names = SheetNames::default();
    for facility in result.facilities() {
        let name = names.claim(facility.facility.as_str());
        write_sheet(&mut workbook, &name, facility, &header_format, include_notes)?;
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    workbook.save(path)?;
    Ok(())
}

fn write_sheet(
    workbook: &mut Workbook,
    name: &str,
    facility: &FacilityResult,
    header_format: &Format,
    include_notes: bool,
) -> Result<(), ExportError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;

    let mut columns: Vec<&str> = HEADERS.to_vec();
    if include_notes {
        columns.push(NOTES_HEADER);
    }
    for (col, title) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, header_format)?;
    }

    for (index, record) in facility.records.iter().enumerate() {
        let row = (index + 1) as u32;
        sheet.write_string(row, 0, &record.id)?;
        sheet.write_string(row, 1, &record.ward)?;
        sheet.write_string(row, 2, &record.name)?;
        sheet.write_string(row, 3, &record.conduct)?;
        if include_notes {
            if let Some(note) = &record.note {
                sheet.write_string(row, 4, note)?;
            }
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    sheet.autofit();
    Ok(())
}

/// Sheet names handed out so far. Excel compares them case-insensitively.
#[derive(Default)]
struct SheetNames {
    used: HashSet<String>,
}

impl SheetNames {
    /// Excel-safe name for `code`, suffixed ` (2)`, ` (3)`... when taken.
    fn claim(&mut self, code: &str) -> String {
        let base = sheet_name(code);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({})", n);
            let keep = SHEET_NAME_MAX - suffix.chars().count();
            candidate = base.chars().take(keep).collect::<String>() + &suffix;
            n += 1;
        }
        self.used.insert(candidate.to_lowercase());
        candidate
    }
}

fn sheet_name(code: &str) -> String {
    let cleaned: String = code
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(SHEET_NAME_MAX)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.is_empty() {
        "Facility".to_string()
    } else {
        cleaned
    }
}
