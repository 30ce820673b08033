//! Log helpers
//!
//! Banner lines for the terminal log and the plain-text run transcript.
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::FacilityCode;
use crate::orchestrator::RunReport;

/// Plain-text transcript of every status line of a run.
pub struct RunLog {
    path: PathBuf,
    file: Option<File>,
}

impl RunLog {
    /// Creates (or truncates) the transcript and writes its dated header.
    ///
    /// A transcript that cannot be written is reported once and then skipped;
    /// it never stops the run.
    pub fn create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let header = format!(
            "{}\nConduct collection log - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        let file = fs::write(&path, header)
            .and_then(|_| OpenOptions::new().append(true).open(&path));
        match file {
            Ok(file) => Self {
                path,
                file: Some(file),
            },
            Err(e) => {
                warn!("Run log {} unavailable: {}", path.display(), e);
                Self { path, file: None }
            }
        }
    }

    /// A second handle appending to the same transcript.
    pub fn try_clone(&self) -> Self {
        let file = self.file.as_ref().and_then(|file| match file.try_clone() {
            Ok(file) => Some(file),
            Err(e) => {
                warn!("Run log {} could not be shared: {}", self.path.display(), e);
                None
            }
        });
        Self {
            path: self.path.clone(),
            file,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, line: &str) {
        if let Some(file) = &mut self.file {
            let stamp = chrono::Local::now().format("%H:%M:%S");
            if let Err(e) = writeln!(file, "[{}] {}", stamp, line) {
                warn!("Run log write failed, disabling it: {}", e);
                self.file = None;
            }
        }
    }
}

/// Records the run start.
pub fn log_startup(facilities: &[FacilityCode]) {
    let codes: Vec<&str> = facilities.iter().map(FacilityCode::as_str).collect();
    info!("{}", "=".repeat(60));
    info!("🚀 Conduct collection");
    info!("🏢 Facilities: {}", codes.join(", "));
    info!("{}", "=".repeat(60));
}

/// Prints the end-of-run summary.
pub fn print_final_stats(report: &RunReport, log_file_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 Collection summary");
    info!(
        "Finished at: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("State: {}", report.state);
    for facility in report.result.facilities() {
        info!("🏢 {}: {} records", facility.facility, facility.records.len());
    }
    info!("✅ Records: {}", report.result.record_count());
    info!("❌ Unavailable: {}", report.result.unavailable_count());
    info!("⏱️ Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
    info!("\nLog saved to: {}", log_file_path.display());
}

/// Shortens text for the one-line status display.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_text("condução", 4), "cond...");
        assert_eq!(truncate_text("ok", 4), "ok");
    }

    #[test]
    fn run_log_writes_header_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        let mut log = RunLog::create(&path);
        log.append("Collecting conduct for facility CPP...");
        drop(log);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Conduct collection log"));
        assert!(content.contains("Collecting conduct for facility CPP..."));
    }

    #[test]
    fn cloned_run_log_appends_to_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        let mut log = RunLog::create(&path);
        let mut other = log.try_clone();
        log.append("first");
        other.append("second");
        drop((log, other));

        let content = fs::read_to_string(&path).unwrap();
        let first = content.find("first").unwrap();
        let second = content.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn unwritable_run_log_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::create(dir.path().join("missing").join("run.txt"));
        log.append("still fine");
    }
}
