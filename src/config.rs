use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::KNOWN_FACILITIES;
use crate::services::WardPolicy;

/// How the worker obtains a browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserMode {
    /// Start a dedicated Chromium process and close it at the end of the run
    Launch,
    /// Attach to a browser already listening on `browser_debug_port`
    Connect,
}

impl FromStr for BrowserMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "launch" => Ok(BrowserMode::Launch),
            "connect" => Ok(BrowserMode::Connect),
            other => Err(format!("unknown browser mode '{}'", other)),
        }
    }
}

/// Program configuration
///
/// Timeouts are in seconds; `0` means wait without limit.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- portal ---
    /// Roster page, the facility code is appended
    pub roster_url: String,
    /// Individual certificate page, the identifier is appended
    pub detail_url: String,
    pub roster_entry_selector: String,
    pub roster_name_selector: String,
    pub conduct_selector: String,
    pub ward_policy: WardPolicy,

    // --- timeouts ---
    pub roster_navigation_timeout_secs: u64,
    pub detail_navigation_timeout_secs: u64,
    pub element_timeout_secs: u64,
    pub quiescence_timeout_secs: u64,

    // --- browser ---
    pub browser_mode: BrowserMode,
    pub browser_debug_port: u16,
    pub chrome_executable: Option<String>,
    pub headless: bool,

    // --- login ---
    pub login_url: String,
    pub username_selector: String,
    pub password_selector: String,
    pub submit_selector: String,
    /// Present only once the portal accepted the credentials
    pub logged_in_selector: String,
    pub portal_username: Option<String>,
    pub portal_password: Option<String>,

    // --- selection & export ---
    pub facilities: Vec<String>,
    pub output_dir: String,
    /// Adds the `Obs.` column with failure notes
    pub include_notes: bool,

    // --- presentation & logging ---
    pub poll_interval_ms: u64,
    pub verbose_logging: bool,
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster_url:
                "https://canaime.com.br/sgp2rr/areas/impressoes/UND_ChamadaFOTOS_todos2.php?id_und_prisional="
                    .to_string(),
            detail_url:
                "https://canaime.com.br/sgp2rr/areas/impressoes/UND_CertidaoCarceraria.php?id_cad_preso="
                    .to_string(),
            roster_entry_selector: ".titulobkSingCAPS".to_string(),
            roster_name_selector: ".titulobkSingCAPS .titulo12bk".to_string(),
            conduct_selector: "tr:nth-child(11) .titulo12bk+ .titulobk".to_string(),
            ward_policy: WardPolicy::LastThree,
            roster_navigation_timeout_secs: 60,
            detail_navigation_timeout_secs: 0,
            element_timeout_secs: 30,
            quiescence_timeout_secs: 30,
            browser_mode: BrowserMode::Launch,
            browser_debug_port: 9222,
            chrome_executable: None,
            headless: false,
            login_url: "https://canaime.com.br/sgp2rr/login/login_principal.php".to_string(),
            username_selector: "input[name='usuario']".to_string(),
            password_selector: "input[name='senha']".to_string(),
            submit_selector: "input[type='submit']".to_string(),
            logged_in_selector: "a[href*='logout']".to_string(),
            portal_username: None,
            portal_password: None,
            facilities: KNOWN_FACILITIES.iter().map(|f| f.to_string()).collect(),
            output_dir: ".".to_string(),
            include_notes: false,
            poll_interval_ms: 100,
            verbose_logging: false,
            output_log_file: "conduct_log.txt".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_string("ROSTER_URL") {
            self.roster_url = v;
        }
        if let Some(v) = env_string("DETAIL_URL") {
            self.detail_url = v;
        }
        if let Some(v) = env_parse("WARD_POLICY", "ward policy")? {
            self.ward_policy = v;
        }
        if let Some(v) = env_parse("ROSTER_NAVIGATION_TIMEOUT_SECS", "u64")? {
            self.roster_navigation_timeout_secs = v;
        }
        if let Some(v) = env_parse("DETAIL_NAVIGATION_TIMEOUT_SECS", "u64")? {
            self.detail_navigation_timeout_secs = v;
        }
        if let Some(v) = env_parse("ELEMENT_TIMEOUT_SECS", "u64")? {
            self.element_timeout_secs = v;
        }
        if let Some(v) = env_parse("QUIESCENCE_TIMEOUT_SECS", "u64")? {
            self.quiescence_timeout_secs = v;
        }
        if let Some(v) = env_parse("BROWSER_MODE", "browser mode")? {
            self.browser_mode = v;
        }
        if let Some(v) = env_parse("BROWSER_DEBUG_PORT", "u16")? {
            self.browser_debug_port = v;
        }
        if let Some(v) = env_string("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(v);
        }
        if let Some(v) = env_parse("HEADLESS", "bool")? {
            self.headless = v;
        }
        if let Some(v) = env_string("LOGIN_URL") {
            self.login_url = v;
        }
        if let Some(v) = env_string("PORTAL_USERNAME") {
            self.portal_username = Some(v);
        }
        if let Some(v) = env_string("PORTAL_PASSWORD") {
            self.portal_password = Some(v);
        }
        if let Some(v) = env_string("FACILITIES") {
            self.facilities = v.split(',').map(|f| f.trim().to_string()).collect();
        }
        if let Some(v) = env_string("OUTPUT_DIR") {
            self.output_dir = v;
        }
        if let Some(v) = env_parse("INCLUDE_NOTES", "bool")? {
            self.include_notes = v;
        }
        if let Some(v) = env_parse("VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        if let Some(v) = env_string("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        Ok(self)
    }

    pub fn roster_navigation_timeout(&self) -> Option<Duration> {
        limit(self.roster_navigation_timeout_secs)
    }

    pub fn detail_navigation_timeout(&self) -> Option<Duration> {
        limit(self.detail_navigation_timeout_secs)
    }

    pub fn element_timeout(&self) -> Option<Duration> {
        limit(self.element_timeout_secs)
    }

    pub fn quiescence_timeout(&self) -> Option<Duration> {
        limit(self.quiescence_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn limit(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}
