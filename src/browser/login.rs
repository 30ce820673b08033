//! Portal login
//!
//! Opens the browser, submits the login form and hands back a
//! [`ChromeSession`] only once the portal shows a logged-in page.

use async_trait::async_trait;
use std::fmt;
use tracing::{info, warn};

use crate::browser::{connect_to_browser, launch_browser, ChromeSession};
use crate::config::{BrowserMode, Config};
use crate::error::SessionError;
use crate::infrastructure::{Authentication, BrowsingSession, DocumentQuery, JsExecutor, SessionProvider};

/// Portal credentials supplied by the operator.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

pub struct ChromeSessionProvider {
    config: Config,
    credentials: Option<Credentials>,
}

impl ChromeSessionProvider {
    /// `None` credentials mean the operator dismissed the login prompt.
    pub fn new(config: Config, credentials: Option<Credentials>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    async fn start_session(&self) -> Result<ChromeSession, SessionError> {
        let (browser, events, owns_browser) = match self.config.browser_mode {
            BrowserMode::Launch => {
                let (browser, events) = launch_browser(&self.config).await?;
                (browser, events, true)
            }
            BrowserMode::Connect => {
                let (browser, events) = connect_to_browser(self.config.browser_debug_port).await?;
                (browser, events, false)
            }
        };

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                events.abort();
                return Err(SessionError::Launch(format!("could not open a page: {}", e)));
            }
        };

        Ok(
            ChromeSession::new(browser, JsExecutor::new(page), events, owns_browser).with_timeouts(
                self.config.element_timeout(),
                self.config.quiescence_timeout(),
            ),
        )
    }

    async fn log_in(
        &self,
        session: &mut ChromeSession,
        credentials: &Credentials,
    ) -> Result<(), SessionError> {
        let config = &self.config;
        session
            .goto(&config.login_url, config.roster_navigation_timeout())
            .await?;
        session.wait_for_quiescence().await?;

        let executor = session.executor();
        if !executor.fill(&config.username_selector, &credentials.username).await? {
            return Err(SessionError::Rejected(format!(
                "username field `{}` not found on the login page",
                config.username_selector
            )));
        }
        if !executor.fill(&config.password_selector, &credentials.password).await? {
            return Err(SessionError::Rejected(format!(
                "password field `{}` not found on the login page",
                config.password_selector
            )));
        }
        if !executor.click(&config.submit_selector).await? {
            return Err(SessionError::Rejected(format!(
                "submit button `{}` not found on the login page",
                config.submit_selector
            )));
        }

        session.wait_for_quiescence().await?;

        if session.count(&config.logged_in_selector).await? == 0 {
            return Err(SessionError::Rejected(
                "the portal did not accept the credentials".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
    type Session = ChromeSession;

    async fn open(&self) -> Result<Authentication<ChromeSession>, SessionError> {
        let Some(credentials) = &self.credentials else {
            warn!("Login abandoned by the operator");
            return Ok(Authentication::Abandoned);
        };

        let mut session = self.start_session().await?;

        info!("Logging in as {}", credentials.username);
        if let Err(e) = self.log_in(&mut session, credentials).await {
            if let Err(close_err) = session.close().await {
                warn!("Browser cleanup after failed login: {}", close_err);
            }
            return Err(e);
        }

        info!("✓ Logged in");
        Ok(Authentication::Authenticated(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_password() {
        let credentials = Credentials::new("operator", "s3cret");
        let shown = format!("{:?}", credentials);
        assert!(shown.contains("operator"));
        assert!(!shown.contains("s3cret"));
    }
}
