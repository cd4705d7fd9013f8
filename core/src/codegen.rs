//! Recording sessions that turn dispatched actions into generated test
//! source. Sessions are a strict state machine: `Active` can move to `Ended`
//! (render + persist) or `Cleared` (discard), and both of those are
//! terminal.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::warn;
use uuid::Uuid;

use crate::CoreError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Ended,
    Cleared,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Active => "active",
            SessionState::Ended => "ended",
            SessionState::Cleared => "cleared",
        };
        write!(f, "{name}")
    }
}

/// Options a session is started with. Doubles as the `codegen.start` action
/// parameters; `output_path` is the one required field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionOptions {
    /// Directory the generated test file is written into.
    pub output_path: String,

    /// Base name for the generated test and its file.
    #[serde(default = "default_test_name_prefix")]
    pub test_name_prefix: String,

    /// Emit a comment line above each generated step.
    #[serde(default)]
    pub include_comments: bool,
}

fn default_test_name_prefix() -> String {
    "GeneratedTest".to_string()
}

/// One dispatched call as a session saw it. Append-only; the outcome line is
/// whatever the envelope reported, success or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedAction {
    pub tool_name: String,
    pub arguments: Value,
    pub timestamp: DateTime<Utc>,
    pub outcome_summary: String,
}

/// Read-only view of a session's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub state: SessionState,
    pub action_count: usize,
    pub created_at: DateTime<Utc>,
    pub output_path: String,
    pub test_name_prefix: String,
}

/// Renders a recorded action list into test source text. Implemented by the
/// codegen crate; tests plug in stubs.
pub trait CodegenBackend: Send + Sync {
    fn render(&self, actions: &[RecordedAction], options: &SessionOptions) -> Result<String>;
}

struct Session {
    options: SessionOptions,
    actions: Vec<RecordedAction>,
    created_at: DateTime<Utc>,
    state: SessionState,
}

/// Owns every codegen session for the process, keyed by generated id.
/// Terminal sessions stay queryable so `end` and `clear` outcomes remain
/// observable.
pub struct CodegenSessions {
    backend: Arc<dyn CodegenBackend>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl CodegenSessions {
    pub fn new(backend: Arc<dyn CodegenBackend>) -> Self {
        Self {
            backend,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an Active session and returns its id.
    pub async fn start(&self, options: SessionOptions) -> Result<String> {
        if options.output_path.trim().is_empty() {
            return Err(CoreError::InvalidArguments(
                "outputPath must not be empty".to_string(),
            ));
        }
        let id = Uuid::new_v4().to_string();
        let session = Session {
            options,
            actions: Vec::new(),
            created_at: Utc::now(),
            state: SessionState::Active,
        };
        self.sessions.lock().await.insert(id.clone(), session);
        debug!("started codegen session {id}");
        Ok(id)
    }

    /// Best-effort append to one session. Unknown ids and terminal sessions
    /// swallow the record so the triggering call's own result is unaffected.
    pub async fn record(&self, session_id: &str, action: RecordedAction) {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(session_id) {
            Some(session) if session.state == SessionState::Active => {
                session.actions.push(action);
            }
            _ => {}
        }
    }

    /// Appends one record to every Active session.
    pub async fn record_all(&self, action: &RecordedAction) {
        let mut sessions = self.sessions.lock().await;
        for session in sessions.values_mut() {
            if session.state == SessionState::Active {
                session.actions.push(action.clone());
            }
        }
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot> {
        let sessions = self.sessions.lock().await;
        let session = sessions
            .get(session_id)
            .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))?;
        Ok(SessionSnapshot {
            id: session_id.to_string(),
            state: session.state,
            action_count: session.actions.len(),
            created_at: session.created_at,
            output_path: session.options.output_path.clone(),
            test_name_prefix: session.options.test_name_prefix.clone(),
        })
    }

    /// Renders the accumulated actions, writes the file under the session's
    /// output path and transitions to Ended. A render or write fault leaves
    /// the session Active so the caller can retry.
    pub async fn end(&self, session_id: &str) -> Result<PathBuf> {
        let (actions, options) = {
            let sessions = self.sessions.lock().await;
            let session = sessions
                .get(session_id)
                .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))?;
            if session.state != SessionState::Active {
                return Err(CoreError::InvalidSessionState {
                    id: session_id.to_string(),
                    state: session.state,
                });
            }
            (session.actions.clone(), session.options.clone())
        };

        let source = self.backend.render(&actions, &options)?;
        let path = generated_file_path(&options, session_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if let Err(err) = tokio::fs::write(&path, source).await {
            warn!("failed to write generated test to {}: {err}", path.display());
            return Err(err.into());
        }

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.state = SessionState::Ended;
        }
        debug!(
            "ended codegen session {session_id}, wrote {}",
            path.display()
        );
        Ok(path)
    }

    /// Discards the recorded actions and transitions to Cleared.
    pub async fn clear(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| CoreError::UnknownSession(session_id.to_string()))?;
        if session.state != SessionState::Active {
            return Err(CoreError::InvalidSessionState {
                id: session_id.to_string(),
                state: session.state,
            });
        }
        session.actions.clear();
        session.state = SessionState::Cleared;
        debug!("cleared codegen session {session_id}");
        Ok(())
    }

    pub async fn has_active(&self) -> bool {
        self.sessions
            .lock()
            .await
            .values()
            .any(|s| s.state == SessionState::Active)
    }
}

fn generated_file_path(options: &SessionOptions, session_id: &str) -> PathBuf {
    let short_id: String = session_id.chars().take(8).collect();
    Path::new(&options.output_path).join(format!("{}_{short_id}.spec.ts", options.test_name_prefix))
}
