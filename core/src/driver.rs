//! Trait boundary to a concrete browser backend. The orchestration core only
//! ever talks to these traits; the CDP implementation lives in its own crate
//! and tests substitute a scripted fake.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::Result;
use crate::config::LaunchOptions;
use crate::config::WaitUntil;
use crate::console::LogKind;

/// How an element is located. CSS is the common case; the rest mirror the
/// dedicated locator actions in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Css(String),
    TestId(String),
    Role { role: String, name: String },
    Text(String),
    Label(String),
    Placeholder(String),
    Title(String),
    AltText(String),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Css(selector) => write!(f, "{selector}"),
            Target::TestId(id) => write!(f, "test id \"{id}\""),
            Target::Role { role, name } => write!(f, "role \"{role}\" named \"{name}\""),
            Target::Text(text) => write!(f, "text \"{text}\""),
            Target::Label(label) => write!(f, "label \"{label}\""),
            Target::Placeholder(p) => write!(f, "placeholder \"{p}\""),
            Target::Title(title) => write!(f, "title \"{title}\""),
            Target::AltText(alt) => write!(f, "alt text \"{alt}\""),
        }
    }
}

/// What to pick inside a `<select>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Value(String),
    Label(String),
    Values(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenshotArea {
    Viewport { width: u32, height: u32 },
    FullPage,
    Element(Target),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfOptions {
    pub format: Option<String>,
    pub print_background: bool,
    pub margins: Option<PdfMargins>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfMargins {
    pub top: Option<String>,
    pub right: Option<String>,
    pub bottom: Option<String>,
    pub left: Option<String>,
}

/// Events a live page pushes at the core. One pump task per page forwards
/// these into the console store and the response correlator.
#[derive(Debug, Clone)]
pub enum PageEvent {
    Console {
        kind: LogKind,
        text: String,
    },
    /// Uncaught page exception; recorded as `LogKind::Exception`.
    PageError {
        text: String,
    },
    Response {
        url: String,
        status: u16,
        /// Body prefix when the backend could fetch one.
        body: Option<String>,
    },
}

pub struct LaunchedBrowser {
    pub browser: Arc<dyn BrowserHandle>,
    pub page: Arc<dyn PageHandle>,
}

#[async_trait]
pub trait Driver: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<LaunchedBrowser>;
}

#[async_trait]
pub trait BrowserHandle: Send + Sync {
    /// Resolves with the next page opened by the browser, e.g. a tab spawned
    /// by a click. Must be armed before the triggering action completes.
    async fn wait_for_page(&self, timeout_ms: u64) -> Result<Arc<dyn PageHandle>>;

    /// Idempotent; closing an already-closed browser is a no-op.
    async fn close(&self) -> Result<()>;
}

#[async_trait]
pub trait PageHandle: Send + Sync {
    async fn navigate(&self, url: &str, wait_until: WaitUntil, timeout_ms: u64) -> Result<()>;
    async fn go_back(&self) -> Result<()>;
    async fn go_forward(&self) -> Result<()>;
    async fn url(&self) -> Result<String>;
    /// With a pattern, waits until the page URL contains or glob-matches it;
    /// without one, returns once any navigation commits.
    async fn wait_for_url(&self, pattern: Option<&str>, timeout_ms: u64) -> Result<String>;

    async fn click(&self, target: &Target, timeout_ms: u64) -> Result<()>;
    async fn double_click(&self, target: &Target, timeout_ms: u64) -> Result<()>;
    async fn right_click(&self, target: &Target, timeout_ms: u64) -> Result<()>;
    async fn hover(&self, target: &Target, timeout_ms: u64) -> Result<()>;
    async fn fill(&self, target: &Target, value: &str, timeout_ms: u64) -> Result<()>;
    /// Per-keystroke input, unlike `fill` which sets the value directly.
    async fn type_text(&self, target: &Target, text: &str, timeout_ms: u64) -> Result<()>;
    async fn press_key(&self, key: &str, target: Option<&Target>, timeout_ms: u64) -> Result<()>;
    async fn select(
        &self,
        target: &Target,
        selection: &Selection,
        timeout_ms: u64,
    ) -> Result<Vec<String>>;
    async fn set_checked(&self, target: &Target, checked: bool, timeout_ms: u64) -> Result<()>;
    async fn drag(&self, source: &Target, dest: &Target, timeout_ms: u64) -> Result<()>;
    async fn scroll_into_view(&self, target: &Target, timeout_ms: u64) -> Result<()>;
    async fn upload_file(&self, target: &Target, path: &Path, timeout_ms: u64) -> Result<()>;

    async fn frame_click(
        &self,
        frame_selector: &str,
        target: &Target,
        timeout_ms: u64,
    ) -> Result<()>;
    async fn frame_fill(
        &self,
        frame_selector: &str,
        target: &Target,
        value: &str,
        timeout_ms: u64,
    ) -> Result<()>;

    async fn evaluate(&self, script: &str) -> Result<Value>;
    async fn text_content(&self, target: &Target, timeout_ms: u64) -> Result<String>;
    async fn attribute(
        &self,
        target: &Target,
        name: &str,
        timeout_ms: u64,
    ) -> Result<Option<String>>;
    async fn input_value(&self, target: &Target, timeout_ms: u64) -> Result<String>;
    async fn is_checked(&self, target: &Target, timeout_ms: u64) -> Result<bool>;
    /// Presence probe; resolves false instead of erroring on a miss.
    async fn exists(&self, target: &Target, timeout_ms: u64) -> Result<bool>;
    async fn wait_for(&self, target: &Target, state: ElementState, timeout_ms: u64) -> Result<()>;

    async fn visible_text(&self) -> Result<String>;
    /// Outer HTML of the page, or of the first element matching `scope`.
    async fn content(&self, scope: Option<&Target>) -> Result<String>;

    /// PNG bytes for the requested area. `timeout_ms` bounds the element
    /// lookup for `ScreenshotArea::Element`.
    async fn screenshot(&self, area: &ScreenshotArea, timeout_ms: u64) -> Result<Vec<u8>>;
    async fn pdf(&self, options: &PdfOptions) -> Result<Vec<u8>>;

    /// Subscribe to this page's event stream. Each page instance has its own
    /// stream; a replaced page's stream ends when the page is dropped.
    fn events(&self) -> broadcast::Receiver<PageEvent>;

    async fn close(&self) -> Result<()>;
}
