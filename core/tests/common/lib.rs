#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Scripted stand-ins for the driver boundary. `FakeDriver` hands out
//! journaling pages so integration tests can assert what the dispatcher did
//! without a real browser, and inject page events by hand.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use pagehand_core::CoreError;
use pagehand_core::Dispatcher;
use pagehand_core::Result;
use pagehand_core::codegen::CodegenBackend;
use pagehand_core::codegen::RecordedAction;
use pagehand_core::codegen::SessionOptions;
use pagehand_core::config::CoreConfig;
use pagehand_core::config::LaunchOptions;
use pagehand_core::config::WaitUntil;
use pagehand_core::correlator::pattern_matches;
use pagehand_core::driver::BrowserHandle;
use pagehand_core::driver::Driver;
use pagehand_core::driver::ElementState;
use pagehand_core::driver::LaunchedBrowser;
use pagehand_core::driver::PageEvent;
use pagehand_core::driver::PageHandle;
use pagehand_core::driver::PdfOptions;
use pagehand_core::driver::ScreenshotArea;
use pagehand_core::driver::Selection;
use pagehand_core::driver::Target;
use serde_json::Value;
use tokio::sync::broadcast;

/// Dispatcher wired to the given fake driver and a recording stub backend.
pub fn test_dispatcher(driver: Arc<FakeDriver>) -> Dispatcher {
    Dispatcher::new(driver, Arc::new(StubBackend::new()), CoreConfig::default())
}

pub fn test_dispatcher_with_backend(
    driver: Arc<FakeDriver>,
    backend: Arc<dyn CodegenBackend>,
) -> Dispatcher {
    Dispatcher::new(driver, backend, CoreConfig::default())
}

/// Scripted [`Driver`]. Every launch produces a fresh page/browser pair,
/// both of which stay inspectable through this handle.
#[derive(Default)]
pub struct FakeDriver {
    launches: Mutex<Vec<LaunchOptions>>,
    failures: Mutex<VecDeque<String>>,
    pages: Mutex<Vec<Arc<FakePage>>>,
    browsers: Mutex<Vec<Arc<FakeBrowser>>>,
}

impl FakeDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a failure; the next launch returns it instead of a browser.
    pub fn fail_next_launch(&self, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .push_back(message.to_string());
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn launch_options(&self) -> Vec<LaunchOptions> {
        self.launches.lock().unwrap().clone()
    }

    pub fn last_page(&self) -> Arc<FakePage> {
        self.pages
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no browser was launched")
    }

    pub fn last_browser(&self) -> Arc<FakeBrowser> {
        self.browsers
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no browser was launched")
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn launch(&self, options: &LaunchOptions) -> Result<LaunchedBrowser> {
        if let Some(message) = self.failures.lock().unwrap().pop_front() {
            return Err(CoreError::Launch(message));
        }
        self.launches.lock().unwrap().push(options.clone());
        let page = Arc::new(FakePage::new());
        let browser = Arc::new(FakeBrowser::default());
        self.pages.lock().unwrap().push(page.clone());
        self.browsers.lock().unwrap().push(browser.clone());
        Ok(LaunchedBrowser { browser, page })
    }
}

#[derive(Default)]
pub struct FakeBrowser {
    closed: AtomicBool,
    queued_pages: Mutex<VecDeque<Arc<FakePage>>>,
}

impl FakeBrowser {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Queues the page the next `wait_for_page` resolves with, as if a click
    /// had opened a tab.
    pub fn queue_new_page(&self, page: Arc<FakePage>) {
        self.queued_pages.lock().unwrap().push_back(page);
    }
}

#[async_trait]
impl BrowserHandle for FakeBrowser {
    async fn wait_for_page(&self, timeout_ms: u64) -> Result<Arc<dyn PageHandle>> {
        // Yield once so a concurrently dispatched click can queue its page.
        tokio::task::yield_now().await;
        match self.queued_pages.lock().unwrap().pop_front() {
            Some(page) => Ok(page),
            None => Err(CoreError::Driver(format!(
                "no new page opened within {timeout_ms}ms"
            ))),
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Journaling [`PageHandle`]. Calls are appended to a journal as readable
/// one-liners; return values come from settable canned state.
pub struct FakePage {
    events: broadcast::Sender<PageEvent>,
    journal: Mutex<Vec<String>>,
    current_url: Mutex<String>,
    eval_result: Mutex<Value>,
    page_text: Mutex<String>,
    page_html: Mutex<String>,
    element_present: Mutex<bool>,
    fail_next: Mutex<Option<String>>,
}

impl Default for FakePage {
    fn default() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            events,
            journal: Mutex::new(Vec::new()),
            current_url: Mutex::new("about:blank".to_string()),
            eval_result: Mutex::new(Value::Null),
            page_text: Mutex::new(String::new()),
            page_html: Mutex::new("<html></html>".to_string()),
            element_present: Mutex::new(true),
            fail_next: Mutex::new(None),
        }
    }
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// Pushes an event at whatever pump is subscribed, like a live page
    /// would.
    pub fn emit(&self, event: PageEvent) {
        let _ = self.events.send(event);
    }

    pub fn set_url(&self, url: &str) {
        *self.current_url.lock().unwrap() = url.to_string();
    }

    pub fn set_eval_result(&self, value: Value) {
        *self.eval_result.lock().unwrap() = value;
    }

    pub fn set_page_text(&self, text: &str) {
        *self.page_text.lock().unwrap() = text.to_string();
    }

    pub fn set_page_html(&self, html: &str) {
        *self.page_html.lock().unwrap() = html.to_string();
    }

    pub fn set_element_present(&self, present: bool) {
        *self.element_present.lock().unwrap() = present;
    }

    /// The next page call fails with `Driver(message)`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    fn note(&self, entry: String) -> Result<()> {
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(CoreError::Driver(message));
        }
        self.journal.lock().unwrap().push(entry);
        Ok(())
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn navigate(&self, url: &str, _wait_until: WaitUntil, _timeout_ms: u64) -> Result<()> {
        self.note(format!("navigate {url}"))?;
        self.set_url(url);
        Ok(())
    }

    async fn go_back(&self) -> Result<()> {
        self.note("go_back".to_string())
    }

    async fn go_forward(&self) -> Result<()> {
        self.note("go_forward".to_string())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.current_url.lock().unwrap().clone())
    }

    async fn wait_for_url(&self, pattern: Option<&str>, timeout_ms: u64) -> Result<String> {
        let url = self.current_url.lock().unwrap().clone();
        let Some(pattern) = pattern else {
            self.note("wait_for_url".to_string())?;
            return Ok(url);
        };
        self.note(format!("wait_for_url {pattern}"))?;
        if pattern_matches(pattern, &url) {
            Ok(url)
        } else {
            Err(CoreError::Navigation(format!(
                "timed out after {timeout_ms}ms waiting for URL matching: {pattern}"
            )))
        }
    }

    async fn click(&self, target: &Target, _timeout_ms: u64) -> Result<()> {
        self.note(format!("click {target}"))
    }

    async fn double_click(&self, target: &Target, _timeout_ms: u64) -> Result<()> {
        self.note(format!("double_click {target}"))
    }

    async fn right_click(&self, target: &Target, _timeout_ms: u64) -> Result<()> {
        self.note(format!("right_click {target}"))
    }

    async fn hover(&self, target: &Target, _timeout_ms: u64) -> Result<()> {
        self.note(format!("hover {target}"))
    }

    async fn fill(&self, target: &Target, value: &str, _timeout_ms: u64) -> Result<()> {
        self.note(format!("fill {target} = {value}"))
    }

    async fn type_text(&self, target: &Target, text: &str, _timeout_ms: u64) -> Result<()> {
        self.note(format!("type {target} = {text}"))
    }

    async fn press_key(&self, key: &str, target: Option<&Target>, _timeout_ms: u64) -> Result<()> {
        match target {
            Some(target) => self.note(format!("press {key} on {target}")),
            None => self.note(format!("press {key}")),
        }
    }

    async fn select(
        &self,
        target: &Target,
        selection: &Selection,
        _timeout_ms: u64,
    ) -> Result<Vec<String>> {
        self.note(format!("select {target} {selection:?}"))?;
        Ok(match selection {
            Selection::Value(value) => vec![value.clone()],
            Selection::Label(label) => vec![label.clone()],
            Selection::Values(values) => values.clone(),
        })
    }

    async fn set_checked(&self, target: &Target, checked: bool, _timeout_ms: u64) -> Result<()> {
        self.note(format!("set_checked {target} {checked}"))
    }

    async fn drag(&self, source: &Target, dest: &Target, _timeout_ms: u64) -> Result<()> {
        self.note(format!("drag {source} -> {dest}"))
    }

    async fn scroll_into_view(&self, target: &Target, _timeout_ms: u64) -> Result<()> {
        self.note(format!("scroll_into_view {target}"))
    }

    async fn upload_file(&self, target: &Target, path: &Path, _timeout_ms: u64) -> Result<()> {
        self.note(format!("upload {target} {}", path.display()))
    }

    async fn frame_click(
        &self,
        frame_selector: &str,
        target: &Target,
        _timeout_ms: u64,
    ) -> Result<()> {
        self.note(format!("frame_click {frame_selector} {target}"))
    }

    async fn frame_fill(
        &self,
        frame_selector: &str,
        target: &Target,
        value: &str,
        _timeout_ms: u64,
    ) -> Result<()> {
        self.note(format!("frame_fill {frame_selector} {target} = {value}"))
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        self.note(format!("evaluate {script}"))?;
        Ok(self.eval_result.lock().unwrap().clone())
    }

    async fn text_content(&self, target: &Target, _timeout_ms: u64) -> Result<String> {
        self.note(format!("text_content {target}"))?;
        Ok(self.page_text.lock().unwrap().clone())
    }

    async fn attribute(
        &self,
        target: &Target,
        name: &str,
        _timeout_ms: u64,
    ) -> Result<Option<String>> {
        self.note(format!("attribute {target} {name}"))?;
        Ok(Some(format!("{name}-value")))
    }

    async fn input_value(&self, target: &Target, _timeout_ms: u64) -> Result<String> {
        self.note(format!("input_value {target}"))?;
        Ok(self.page_text.lock().unwrap().clone())
    }

    async fn is_checked(&self, target: &Target, _timeout_ms: u64) -> Result<bool> {
        self.note(format!("is_checked {target}"))?;
        Ok(*self.element_present.lock().unwrap())
    }

    async fn exists(&self, target: &Target, _timeout_ms: u64) -> Result<bool> {
        self.note(format!("exists {target}"))?;
        Ok(*self.element_present.lock().unwrap())
    }

    async fn wait_for(&self, target: &Target, state: ElementState, _timeout_ms: u64) -> Result<()> {
        self.note(format!("wait_for {target} {state:?}"))
    }

    async fn visible_text(&self) -> Result<String> {
        self.note("visible_text".to_string())?;
        Ok(self.page_text.lock().unwrap().clone())
    }

    async fn content(&self, scope: Option<&Target>) -> Result<String> {
        match scope {
            Some(target) => self.note(format!("content {target}"))?,
            None => self.note("content".to_string())?,
        }
        Ok(self.page_html.lock().unwrap().clone())
    }

    async fn screenshot(&self, area: &ScreenshotArea, _timeout_ms: u64) -> Result<Vec<u8>> {
        self.note(format!("screenshot {area:?}"))?;
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn pdf(&self, _options: &PdfOptions) -> Result<Vec<u8>> {
        self.note("pdf".to_string())?;
        Ok(b"%PDF-1.4 fake".to_vec())
    }

    fn events(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }

    async fn close(&self) -> Result<()> {
        self.note("close".to_string())
    }
}

/// Recording [`CodegenBackend`] stub. Remembers how many actions each render
/// saw; the failing variant reports a render fault instead.
#[derive(Default)]
pub struct StubBackend {
    fail: bool,
    rendered: Mutex<Vec<usize>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            rendered: Mutex::new(Vec::new()),
        }
    }

    /// Action counts passed to `render`, in call order.
    pub fn render_counts(&self) -> Vec<usize> {
        self.rendered.lock().unwrap().clone()
    }
}

impl CodegenBackend for StubBackend {
    fn render(&self, actions: &[RecordedAction], options: &SessionOptions) -> Result<String> {
        if self.fail {
            return Err(CoreError::Render("stub render failure".to_string()));
        }
        self.rendered.lock().unwrap().push(actions.len());
        let steps: Vec<String> = actions
            .iter()
            .map(|action| format!("// {}: {}", action.tool_name, action.outcome_summary))
            .collect();
        Ok(format!(
            "// {} action(s) for {}\n{}\n",
            actions.len(),
            options.test_name_prefix,
            steps.join("\n")
        ))
    }
}
