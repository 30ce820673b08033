//! Command line and the interactive prompts of the selection step

use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::browser::Credentials;
use crate::config::Config;
use crate::error::ConfigError;
use crate::models::{normalize_selection, FacilityCode};
use crate::services::WardPolicy;

#[derive(Debug, Parser)]
#[command(
    name = "conduct_roster",
    version,
    about = "Collects facility rosters and conduct records into a spreadsheet"
)]
pub struct Cli {
    /// Facility code to collect; repeat for several
    #[arg(short, long = "facility", value_name = "CODE")]
    pub facilities: Vec<String>,

    /// Collect every configured facility
    #[arg(long, conflicts_with = "facilities")]
    pub all: bool,

    /// TOML configuration file
    #[arg(short, long, env = "CONDUCT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Save the workbook here without asking
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Accept the suggested file name without asking
    #[arg(short = 'y', long, conflicts_with = "output")]
    pub yes: bool,

    /// Ward extraction: `raw` or `last_three`
    #[arg(long, value_name = "POLICY")]
    pub ward_policy: Option<WardPolicy>,

    /// Add the Obs. column with failure notes
    #[arg(long)]
    pub notes: bool,

    /// Run the browser without a window
    #[arg(long)]
    pub headless: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Command line flags take precedence over file and environment.
    pub fn apply(&self, config: &mut Config) {
        if let Some(policy) = self.ward_policy {
            config.ward_policy = policy;
        }
        if self.notes {
            config.include_notes = true;
        }
        if self.headless {
            config.headless = true;
        }
        if self.verbose {
            config.verbose_logging = true;
        }
    }

    /// Resolves the facility selection, asking when none was given.
    pub fn select_facilities<R: BufRead, W: Write>(
        &self,
        config: &Config,
        input: &mut R,
        output: &mut W,
    ) -> Result<Vec<FacilityCode>, ConfigError> {
        let selected = if self.all {
            normalize_selection(&config.facilities)
        } else if !self.facilities.is_empty() {
            normalize_selection(&self.facilities)
        } else {
            prompt_facilities(config, input, output)
        };

        if selected.is_empty() {
            return Err(ConfigError::NoFacilities);
        }
        Ok(selected)
    }
}

/// Lists the configured facilities and reads a comma or space separated answer.
pub fn prompt_facilities<R: BufRead, W: Write>(
    config: &Config,
    input: &mut R,
    output: &mut W,
) -> Vec<FacilityCode> {
    let _ = writeln!(output, "Select the facilities:");
    for facility in &config.facilities {
        let _ = writeln!(output, "  - {}", facility);
    }
    let _ = write!(output, "Codes (comma separated, `all` for every one): ");
    let _ = output.flush();

    let mut answer = String::new();
    if input.read_line(&mut answer).unwrap_or(0) == 0 {
        return Vec::new();
    }
    let answer = answer.trim();
    if answer.eq_ignore_ascii_case("all") {
        return normalize_selection(&config.facilities);
    }
    normalize_selection(answer.split(|c: char| c == ',' || c.is_whitespace()))
}

/// Credentials from the configuration, or asked for. An empty username
/// means the operator gave up.
pub fn resolve_credentials<R: BufRead, W: Write>(
    config: &Config,
    input: &mut R,
    output: &mut W,
) -> Option<Credentials> {
    if let (Some(username), Some(password)) = (&config.portal_username, &config.portal_password) {
        return Some(Credentials::new(username, password));
    }

    let username = match &config.portal_username {
        Some(username) => username.clone(),
        None => ask(input, output, "Portal username (empty to cancel): ")?,
    };
    let password = ask(input, output, "Portal password: ")?;
    Some(Credentials::new(username, password))
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Option<String> {
    let _ = write!(output, "{}", question);
    let _ = output.flush();
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let answer = answer.trim_end_matches(['\r', '\n']).to_string();
            (!answer.is_empty()).then_some(answer)
        }
    }
}
