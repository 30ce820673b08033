//! Scripted portal used by the integration tests
//!
//! Serves roster and certificate pages from memory and records what the
//! collectors did with them.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use conduct_roster::error::{QueryError, QueryResult, SessionError};
use conduct_roster::progress::{Progress, ProgressStream};
use conduct_roster::{Authentication, BrowsingSession, Config, DocumentQuery, SessionProvider};

pub const ROSTER_URL: &str = "portal://roster/";
pub const DETAIL_URL: &str = "portal://detail/";

pub fn test_config() -> Config {
    Config {
        roster_url: ROSTER_URL.to_string(),
        detail_url: DETAIL_URL.to_string(),
        ..Config::default()
    }
}

#[derive(Clone, Debug)]
pub enum Entry {
    Listed { block: String, name: String },
    Broken(QueryError),
}

/// A well-formed roster entry for identifier `id`.
pub fn listed(id: &str, ward: &str, name: &str) -> Entry {
    Entry::Listed {
        block: format!("AB{}\n \n \n \n{}", id, ward),
        name: name.to_string(),
    }
}

pub fn raw_entry(block: &str, name: &str) -> Entry {
    Entry::Listed {
        block: block.to_string(),
        name: name.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Login {
    Accept,
    Abandon,
    Reject,
}

#[derive(Debug, Default)]
pub struct PortalLog {
    pub opened: usize,
    pub closed: usize,
    pub visits: Vec<String>,
}

#[derive(Clone)]
pub struct Portal {
    config: Config,
    rosters: HashMap<String, Vec<Entry>>,
    conducts: HashMap<String, QueryResult<String>>,
    unreachable: HashMap<String, QueryError>,
    panic_on: Option<String>,
    cancel_on: Option<(String, CancellationToken)>,
    login: Login,
    close_fails: bool,
    pub log: Arc<Mutex<PortalLog>>,
}

impl Portal {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            rosters: HashMap::new(),
            conducts: HashMap::new(),
            unreachable: HashMap::new(),
            panic_on: None,
            cancel_on: None,
            login: Login::Accept,
            close_fails: false,
            log: Arc::new(Mutex::new(PortalLog::default())),
        }
    }

    pub fn roster(mut self, facility: &str, entries: Vec<Entry>) -> Self {
        self.rosters
            .insert(format!("{}{}", ROSTER_URL, facility), entries);
        self
    }

    pub fn conduct(mut self, id: &str, conduct: &str) -> Self {
        self.conducts
            .insert(detail_url(id), Ok(conduct.to_string()));
        self
    }

    pub fn conduct_error(mut self, id: &str, error: QueryError) -> Self {
        self.conducts.insert(detail_url(id), Err(error));
        self
    }

    pub fn unreachable_roster(mut self, facility: &str) -> Self {
        let url = format!("{}{}", ROSTER_URL, facility);
        self.unreachable.insert(
            url.clone(),
            QueryError::Navigation {
                url,
                detail: "net::ERR_CONNECTION_RESET".to_string(),
            },
        );
        self
    }

    pub fn panic_on_detail(mut self, id: &str) -> Self {
        self.panic_on = Some(detail_url(id));
        self
    }

    /// Sets `token` as soon as `url` is visited.
    pub fn cancel_on_visit(mut self, url: String, token: CancellationToken) -> Self {
        self.cancel_on = Some((url, token));
        self
    }

    /// Closing the session is counted but reports a shutdown error.
    pub fn failing_close(mut self) -> Self {
        self.close_fails = true;
        self
    }

    pub fn login(mut self, login: Login) -> Self {
        self.login = login;
        self
    }

    pub fn session(&self) -> PortalSession {
        self.log.lock().unwrap().opened += 1;
        PortalSession {
            portal: self.clone(),
            current: String::new(),
        }
    }

    pub fn opened(&self) -> usize {
        self.log.lock().unwrap().opened
    }

    pub fn closed(&self) -> usize {
        self.log.lock().unwrap().closed
    }

    pub fn visits(&self) -> Vec<String> {
        self.log.lock().unwrap().visits.clone()
    }
}

pub fn roster_url(facility: &str) -> String {
    format!("{}{}", ROSTER_URL, facility)
}

pub fn detail_url(id: &str) -> String {
    format!("{}{}", DETAIL_URL, id)
}

pub struct PortalSession {
    portal: Portal,
    current: String,
}

impl PortalSession {
    fn roster(&self) -> &[Entry] {
        self.portal
            .rosters
            .get(&self.current)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[async_trait]
impl DocumentQuery for PortalSession {
    async fn goto(&mut self, url: &str, _timeout: Option<Duration>) -> QueryResult<()> {
        self.portal.log.lock().unwrap().visits.push(url.to_string());
        if let Some((trigger, token)) = &self.portal.cancel_on {
            if trigger == url {
                token.cancel();
            }
        }
        if self.portal.panic_on.as_deref() == Some(url) {
            panic!("renderer crashed on {}", url);
        }
        if let Some(error) = self.portal.unreachable.get(url) {
            return Err(error.clone());
        }
        self.current = url.to_string();
        Ok(())
    }

    async fn wait_for_quiescence(&mut self) -> QueryResult<()> {
        Ok(())
    }

    async fn text(&mut self, selector: &str) -> QueryResult<String> {
        if selector != self.portal.config.conduct_selector {
            return Err(QueryError::MissingElement {
                selector: selector.to_string(),
            });
        }
        match self.portal.conducts.get(&self.current) {
            Some(result) => result.clone(),
            None => Err(QueryError::MissingElement {
                selector: selector.to_string(),
            }),
        }
    }

    async fn count(&mut self, selector: &str) -> QueryResult<usize> {
        if selector == self.portal.config.roster_entry_selector {
            Ok(self.roster().len())
        } else {
            Ok(0)
        }
    }

    async fn nth_text(&mut self, selector: &str, index: usize) -> QueryResult<String> {
        let config = &self.portal.config;
        let entry = self.roster().get(index).cloned().ok_or_else(|| QueryError::IndexOutOfRange {
            selector: selector.to_string(),
            index,
            len: self.roster().len(),
        })?;
        match entry {
            Entry::Broken(error) => Err(error),
            Entry::Listed { block, .. } if selector == config.roster_entry_selector => Ok(block),
            Entry::Listed { name, .. } if selector == config.roster_name_selector => Ok(name),
            Entry::Listed { .. } => Err(QueryError::MissingElement {
                selector: selector.to_string(),
            }),
        }
    }
}

#[async_trait]
impl BrowsingSession for PortalSession {
    async fn close(self) -> Result<(), SessionError> {
        self.portal.log.lock().unwrap().closed += 1;
        if self.portal.close_fails {
            return Err(SessionError::Shutdown("browser process already gone".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for Portal {
    type Session = PortalSession;

    async fn open(&self) -> Result<Authentication<PortalSession>, SessionError> {
        match self.login {
            Login::Accept => Ok(Authentication::Authenticated(self.session())),
            Login::Abandon => Ok(Authentication::Abandoned),
            Login::Reject => Err(SessionError::Rejected(
                "the portal did not accept the credentials".to_string(),
            )),
        }
    }
}

/// Status lines currently queued, in order.
pub fn statuses(stream: &mut ProgressStream) -> Vec<String> {
    stream
        .drain()
        .messages
        .into_iter()
        .filter_map(|message| match message {
            Progress::Status(line) => Some(line),
            _ => None,
        })
        .collect()
}
