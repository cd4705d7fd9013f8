use serde::Deserialize;
use serde::Serialize;

/// Uniform response shape for every dispatched action. Constructed once,
/// never mutated; faults become an error envelope instead of escaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub messages: Vec<String>,
    pub is_error: bool,
}

impl ExecutionResult {
    pub fn ok(messages: Vec<String>) -> Self {
        Self {
            success: true,
            messages,
            is_error: false,
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self::ok(vec![text.into()])
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![text.into()],
            is_error: true,
        }
    }

    /// One-line digest used when recording the call into a codegen session.
    pub fn summary(&self) -> String {
        match self.messages.first() {
            Some(first) => first.clone(),
            None if self.is_error => "error".to_string(),
            None => "ok".to_string(),
        }
    }
}
