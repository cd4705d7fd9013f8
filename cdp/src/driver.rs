//! Launches Chromium and hands the core a connected browser/page pair.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Browser;
use chromiumoxide::Page;
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::browser::HeadlessMode;
use chromiumoxide::cdp::browser_protocol::network;
use chromiumoxide::handler::viewport::Viewport as EmulatedViewport;
use futures::StreamExt;
use pagehand_core::CoreError;
use pagehand_core::Result;
use pagehand_core::config::BrowserEngine;
use pagehand_core::config::LaunchOptions;
use pagehand_core::driver::BrowserHandle;
use pagehand_core::driver::Driver;
use pagehand_core::driver::LaunchedBrowser;
use pagehand_core::driver::PageHandle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::sleep;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::cdp_err;
use crate::page::CdpPage;

const LAUNCH_FLAGS: [&str; 6] = [
    "--disable-blink-features=AutomationControlled",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-background-networking",
    "--disable-hang-monitor",
    "--remote-allow-origins=*",
];

const NEW_PAGE_POLL: Duration = Duration::from_millis(100);

/// Launches and owns Chromium processes. Only the `chromium` engine is
/// available over CDP; requests for any other engine fail up front instead
/// of silently launching the wrong browser.
#[derive(Debug, Default)]
pub struct CdpDriver;

impl CdpDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for CdpDriver {
    async fn launch(&self, options: &LaunchOptions) -> Result<LaunchedBrowser> {
        if options.engine != BrowserEngine::Chromium {
            return Err(CoreError::Launch(format!(
                "engine \"{}\" is not available over CDP; use \"chromium\"",
                options.engine
            )));
        }

        let user_data_dir = temp_profile_dir();
        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(options.viewport.width, options.viewport.height)
            .viewport(EmulatedViewport {
                width: options.viewport.width,
                height: options.viewport.height,
                device_scale_factor: None,
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            })
            .request_timeout(Duration::from_millis(options.timeout_ms));
        builder = if options.headless {
            builder.headless_mode(HeadlessMode::New)
        } else {
            builder.with_head()
        };
        for flag in LAUNCH_FLAGS {
            builder = builder.arg(flag);
        }
        let config = builder.build().map_err(CoreError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CoreError::Launch(e.to_string()))?;
        // The handler task is the CDP connection pump; every command and
        // event stalls if it stops being polled.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(CoreError::Launch(e.to_string()));
            }
        };
        if let Some(user_agent) = &options.user_agent {
            apply_user_agent(&page, user_agent).await?;
        }
        info!(
            "launched chromium ({}x{}, headless={})",
            options.viewport.width, options.viewport.height, options.headless
        );

        let browser = CdpBrowser {
            inner: Mutex::new(Some(browser)),
            handler_task: Mutex::new(Some(handler_task)),
            user_agent: options.user_agent.clone(),
            user_data_dir,
        };
        Ok(LaunchedBrowser {
            browser: Arc::new(browser),
            page: Arc::new(CdpPage::new(page)),
        })
    }
}

/// One launched Chromium process together with its connection pump task and
/// the throwaway profile directory it writes to.
pub struct CdpBrowser {
    inner: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    user_agent: Option<String>,
    user_data_dir: PathBuf,
}

impl CdpBrowser {
    async fn current_pages(&self) -> Result<Vec<Page>> {
        let guard = self.inner.lock().await;
        let Some(browser) = guard.as_ref() else {
            return Err(CoreError::Driver("browser is closed".to_string()));
        };
        browser.pages().await.map_err(cdp_err)
    }

    async fn target_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .current_pages()
            .await?
            .iter()
            .map(|page| page.target_id().inner().clone())
            .collect())
    }
}

#[async_trait]
impl BrowserHandle for CdpBrowser {
    async fn wait_for_page(&self, timeout_ms: u64) -> Result<Arc<dyn PageHandle>> {
        // Snapshot the targets that already exist so only a tab opened after
        // this call counts, then poll for a newcomer.
        let known = self.target_ids().await?;
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            for page in self.current_pages().await? {
                let id = page.target_id().inner().clone();
                if known.contains(&id) {
                    continue;
                }
                debug!("picked up new page target {id}");
                // Let the tab commit its navigation so callers observe the
                // real URL instead of about:blank.
                let _ = tokio::time::timeout(
                    Duration::from_millis(2000),
                    page.wait_for_navigation(),
                )
                .await;
                if let Some(user_agent) = &self.user_agent {
                    apply_user_agent(&page, user_agent).await?;
                }
                return Ok(Arc::new(CdpPage::new(page)));
            }
            if Instant::now() >= deadline {
                return Err(CoreError::Driver(format!(
                    "no new page opened within {timeout_ms}ms"
                )));
            }
            sleep(NEW_PAGE_POLL).await;
        }
    }

    async fn close(&self) -> Result<()> {
        let Some(mut browser) = self.inner.lock().await.take() else {
            return Ok(());
        };
        // Graceful close needs the pump alive; the process dies on drop
        // either way.
        if let Err(e) = browser.close().await {
            warn!("browser close: {e}");
        }
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        let _ = tokio::fs::remove_dir_all(&self.user_data_dir).await;
        Ok(())
    }
}

pub(crate) async fn apply_user_agent(page: &Page, user_agent: &str) -> Result<()> {
    let params = network::SetUserAgentOverrideParams::builder()
        .user_agent(user_agent)
        .build()
        .map_err(CoreError::Driver)?;
    page.execute(params).await.map_err(cdp_err)?;
    Ok(())
}

fn temp_profile_dir() -> PathBuf {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    std::env::temp_dir().join(format!("pagehand-profile-{}-{stamp}", std::process::id()))
}
