pub mod actions;
pub mod codegen;
pub mod config;
pub mod console;
pub mod correlator;
pub mod dispatcher;
pub mod driver;
pub mod envelope;
pub mod global;
pub mod handlers;
pub mod http;
pub mod manager;

pub use actions::Action;
pub use actions::ActionKind;
pub use actions::ToolCall;
pub use codegen::CodegenBackend;
pub use codegen::CodegenSessions;
pub use codegen::SessionState;
pub use config::BrowserEngine;
pub use config::CoreConfig;
pub use config::LaunchOptions;
pub use config::Viewport;
pub use console::ConsoleStore;
pub use console::LogKind;
pub use correlator::ResponseCorrelator;
pub use dispatcher::Dispatcher;
pub use driver::Driver;
pub use driver::PageHandle;
pub use envelope::ExecutionResult;
pub use manager::PageManager;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Timed out after {timeout_ms}ms waiting for element: {locator}")]
    ElementTimeout { locator: String, timeout_ms: u64 },

    #[error("Iframe not found: {0}")]
    IframeNotFound(String),

    #[error("No codegen session found with id: {0}")]
    UnknownSession(String),

    #[error("Codegen session {id} is {state}; operation requires an active session")]
    InvalidSessionState {
        id: String,
        state: codegen::SessionState,
    },

    #[error("No response wait registered with id: {0}")]
    UnknownWait(String),

    #[error("A response wait with id {0} is already pending")]
    DuplicateWait(String),

    #[error("Timed out waiting for response matching: {pattern}")]
    ResponseTimeout { pattern: String },

    #[error("Response body does not contain expected value: {fragment}. Body was: {body}")]
    ResponseMismatch { fragment: String, body: String },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("{0}")]
    InvalidArguments(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Codegen render failed: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
