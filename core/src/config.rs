use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

/// Tunables for the orchestration core. Everything has a serde default so a
/// host can deserialize a partial table or just use `Default`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Retention cap for the console log store; oldest entries are evicted
    /// first once the cap is exceeded.
    #[serde(default = "default_console_capacity")]
    pub console_capacity: usize,

    /// Window within which an armed response wait can resolve, measured from
    /// the expect call.
    #[serde(default = "default_timeout_ms")]
    pub response_window_ms: u64,

    /// Byte budget for captured response body snippets.
    #[serde(default = "default_response_body_limit")]
    pub response_body_limit: usize,

    /// Fallback timeout for element lookups when a call does not carry one.
    #[serde(default = "default_timeout_ms")]
    pub element_timeout_ms: u64,

    #[serde(default)]
    pub launch: LaunchOptions,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            console_capacity: default_console_capacity(),
            response_window_ms: default_timeout_ms(),
            response_body_limit: default_response_body_limit(),
            element_timeout_ms: default_timeout_ms(),
            launch: LaunchOptions::default(),
        }
    }
}

/// Parameters a browser instance is launched with. Two option sets that
/// differ anywhere except `timeout_ms` describe different instances and
/// force a relaunch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOptions {
    #[serde(default)]
    pub engine: BrowserEngine,

    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            engine: BrowserEngine::default(),
            viewport: default_viewport(),
            headless: false,
            timeout_ms: default_timeout_ms(),
            user_agent: None,
        }
    }
}

impl LaunchOptions {
    /// True when a live instance launched with `self` cannot serve a request
    /// for `wanted`. Timeout is a per-call concern, not an instance one.
    pub fn mismatches(&self, wanted: &LaunchOptions) -> bool {
        self.engine != wanted.engine
            || self.viewport != wanted.viewport
            || self.headless != wanted.headless
            || self.user_agent != wanted.user_agent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BrowserEngine {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl std::fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserEngine::Chromium => write!(f, "chromium"),
            BrowserEngine::Firefox => write!(f, "firefox"),
            BrowserEngine::Webkit => write!(f, "webkit"),
        }
    }
}

/// Navigation wait condition, mirroring the driver's load states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    #[default]
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

fn default_console_capacity() -> usize {
    1000
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_response_body_limit() -> usize {
    4096
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1280,
        height: 720,
    }
}
