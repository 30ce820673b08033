use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::SessionError;

/// Attaches to a browser started with `--remote-debugging-port`.
pub async fn connect_to_browser(port: u16) -> Result<(Browser, JoinHandle<()>), SessionError> {
    let browser_url = format!("http://localhost:{}", port);
    info!("Connecting to browser: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("Browser connection failed: {}", e);
        SessionError::Connection {
            port,
            detail: e.to_string(),
        }
    })?;
    debug!("Browser connected");

    let events = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok((browser, events))
}
