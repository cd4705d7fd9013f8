//! Owns the single live browser/page pair. Launching is lazy and idempotent;
//! a request whose launch options differ from the live instance tears it
//! down and starts over. Console and response-wait state is scoped to the
//! page instance and dies with it.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::Result;
use crate::config::LaunchOptions;
use crate::console::ConsoleStore;
use crate::console::LogKind;
use crate::correlator::ResponseCorrelator;
use crate::driver::BrowserHandle;
use crate::driver::Driver;
use crate::driver::PageEvent;
use crate::driver::PageHandle;

struct LiveInstance {
    browser: Arc<dyn BrowserHandle>,
    page: Arc<dyn PageHandle>,
    options: LaunchOptions,
}

pub struct PageManager {
    driver: Arc<dyn Driver>,
    console: Arc<ConsoleStore>,
    correlator: Arc<ResponseCorrelator>,
    live: Mutex<Option<LiveInstance>>,
}

impl PageManager {
    pub fn new(
        driver: Arc<dyn Driver>,
        console: Arc<ConsoleStore>,
        correlator: Arc<ResponseCorrelator>,
    ) -> Self {
        Self {
            driver,
            console,
            correlator,
            live: Mutex::new(None),
        }
    }

    /// Returns the live page, launching one if necessary. A live instance
    /// whose options mismatch `wanted` is torn down first; its console and
    /// pending-wait state goes with it.
    pub async fn ensure_page(&self, wanted: &LaunchOptions) -> Result<Arc<dyn PageHandle>> {
        let mut live = self.live.lock().await;
        if let Some(instance) = live.as_ref() {
            if !instance.options.mismatches(wanted) {
                return Ok(instance.page.clone());
            }
            info!(
                "relaunching browser: requested {} configuration differs from live instance",
                wanted.engine
            );
            let old = live.take();
            drop_instance(old, &self.console, &self.correlator).await;
        }

        let launched = self.driver.launch(wanted).await?;
        debug!("launched {} browser", wanted.engine);
        self.attach_listeners(&launched.page);
        let page = launched.page.clone();
        *live = Some(LiveInstance {
            browser: launched.browser,
            page: launched.page,
            options: wanted.clone(),
        });
        Ok(page)
    }

    /// Launch options of the live instance, if any. Callers that must not
    /// trigger a relaunch base their request on these.
    pub async fn current_options(&self) -> Option<LaunchOptions> {
        self.live.lock().await.as_ref().map(|i| i.options.clone())
    }

    pub async fn browser(&self) -> Option<Arc<dyn BrowserHandle>> {
        self.live.lock().await.as_ref().map(|i| i.browser.clone())
    }

    pub async fn is_running(&self) -> bool {
        self.live.lock().await.is_some()
    }

    /// Replaces the active page after a tab switch. The old page stays open
    /// in the browser; only the handle and its listeners move over.
    pub async fn set_active_page(&self, new_page: Arc<dyn PageHandle>) {
        let mut live = self.live.lock().await;
        match live.as_mut() {
            Some(instance) => {
                self.attach_listeners(&new_page);
                instance.page = new_page;
                debug!("active page replaced after tab switch");
            }
            None => warn!("ignoring tab switch: no live browser"),
        }
    }

    /// Shuts the browser down and clears page-scoped state. Calling this
    /// with nothing open is a no-op.
    pub async fn close_all(&self) {
        let old = self.live.lock().await.take();
        if old.is_some() {
            drop_instance(old, &self.console, &self.correlator).await;
            info!("browser closed");
        }
    }

    /// One pump task per page instance; forwards console and network events
    /// into the stores. Ends when the page's event channel closes.
    fn attach_listeners(&self, page: &Arc<dyn PageHandle>) {
        let mut events = page.events();
        let console = self.console.clone();
        let correlator = self.correlator.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(PageEvent::Console { kind, text }) => {
                        console.record(kind, text).await;
                    }
                    Ok(PageEvent::PageError { text }) => {
                        console.record(LogKind::Exception, text).await;
                    }
                    Ok(PageEvent::Response { url, status, body }) => {
                        correlator.observe(&url, status, body.as_deref()).await;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!("page event pump lagged, dropped {missed} events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}

async fn drop_instance(
    old: Option<LiveInstance>,
    console: &ConsoleStore,
    correlator: &ResponseCorrelator,
) {
    let Some(instance) = old else {
        return;
    };
    if let Err(err) = instance.page.close().await {
        debug!("close page: {err}");
    }
    if let Err(err) = instance.browser.close().await {
        warn!("close browser: {err}");
    }
    console.clear().await;
    correlator.clear().await;
}
