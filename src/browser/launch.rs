use std::path::Path;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::SessionError;

/// Starts a dedicated Chromium process.
///
/// Returns the browser and the task driving its CDP event stream; the task
/// must outlive every page call.
pub async fn launch_browser(config: &Config) -> Result<(Browser, JoinHandle<()>), SessionError> {
    info!("🚀 Launching browser (headless: {})...", config.headless);

    let mut builder = BrowserConfig::builder();
    builder = if config.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &config.chrome_executable {
        debug!("Browser executable: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let browser_config = builder
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ])
        .build()
        .map_err(|e| {
            error!("Browser configuration failed: {}", e);
            SessionError::Configuration(e)
        })?;

    let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
        error!("Browser launch failed: {}", e);
        SessionError::Launch(e.to_string())
    })?;
    debug!("Browser launched");

    let events = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    Ok((browser, events))
}
