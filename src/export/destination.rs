//! Where the workbook goes
//!
//! The operator confirms or replaces the suggested path, or declines to save.

use chrono::NaiveDate;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// `Conduct List DD-MM-YYYY.xlsx`
pub fn suggested_file_name(date: NaiveDate) -> String {
    format!("Conduct List {}.xlsx", date.format("%d-%m-%Y"))
}

/// Picks the save path; `None` means the operator declined.
pub trait PathChooser {
    fn choose(&mut self, suggested: &Path) -> Option<PathBuf>;
}

/// Non-interactive choice: a fixed path, the suggestion, or nothing.
#[derive(Debug, Clone)]
pub enum FixedChooser {
    Path(PathBuf),
    Suggested,
    Decline,
}

impl PathChooser for FixedChooser {
    fn choose(&mut self, suggested: &Path) -> Option<PathBuf> {
        match self {
            FixedChooser::Path(path) => Some(with_xlsx_extension(path.clone())),
            FixedChooser::Suggested => Some(suggested.to_path_buf()),
            FixedChooser::Decline => None,
        }
    }
}

/// Asks on a terminal. Empty answer keeps the suggestion, `n` declines,
/// anything else is taken as the path.
pub struct PromptChooser<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> PathChooser for PromptChooser<R, W> {
    fn choose(&mut self, suggested: &Path) -> Option<PathBuf> {
        let _ = write!(
            self.output,
            "Save the workbook to [{}] (Enter to accept, n to skip): ",
            suggested.display()
        );
        let _ = self.output.flush();

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(0) | Err(_) => None,
            Ok(_) => match answer.trim() {
                "" => Some(suggested.to_path_buf()),
                "n" | "N" | "no" | "No" => None,
                path => Some(with_xlsx_extension(PathBuf::from(path))),
            },
        }
    }
}

fn with_xlsx_extension(path: PathBuf) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("xlsx")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(answer: &str) -> Option<PathBuf> {
        let mut chooser = PromptChooser::new(Cursor::new(answer.to_string()), Vec::new());
        chooser.choose(Path::new("out/Conduct List 01-02-2026.xlsx"))
    }

    #[test]
    fn file_name_embeds_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert_eq!(suggested_file_name(date), "Conduct List 01-02-2026.xlsx");
    }

    #[test]
    fn enter_accepts_suggestion() {
        assert_eq!(ask("\n"), Some(PathBuf::from("out/Conduct List 01-02-2026.xlsx")));
    }

    #[test]
    fn n_declines_and_eof_declines() {
        assert_eq!(ask("n\n"), None);
        assert_eq!(ask(""), None);
    }

    #[test]
    fn typed_path_gets_extension() {
        assert_eq!(ask("reports/cpp\n"), Some(PathBuf::from("reports/cpp.xlsx")));
        assert_eq!(ask("reports/cpp.xls\n"), Some(PathBuf::from("reports/cpp.xls")));
    }
}
