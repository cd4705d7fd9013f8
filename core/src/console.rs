use std::collections::VecDeque;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;

/// Category of a captured console event. `Exception` covers uncaught page
/// errors, which arrive on a separate driver event but live in the same
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Log,
    Info,
    Warning,
    Error,
    Debug,
    Exception,
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogKind::Log => "log",
            LogKind::Info => "info",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
            LogKind::Debug => "debug",
            LogKind::Exception => "exception",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleEntry {
    pub kind: LogKind,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    /// `None` means all kinds.
    pub kind: Option<LogKind>,
    /// Plain substring match over entry text. Brackets and other regex
    /// metacharacters in the needle are literal.
    pub search: Option<String>,
    /// Keep only the most recent N matches, preserving arrival order.
    pub limit: Option<usize>,
}

/// Bounded append-only record of console events for the current page
/// instance. Oldest entries are evicted first once `capacity` is exceeded.
pub struct ConsoleStore {
    capacity: usize,
    entries: Mutex<VecDeque<ConsoleEntry>>,
}

impl ConsoleStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn record(&self, kind: LogKind, text: impl Into<String>) {
        let entry = ConsoleEntry {
            kind,
            text: text.into(),
            timestamp: Utc::now(),
        };
        let mut entries = self.entries.lock().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns matching entries in arrival order. With `drain` set the whole
    /// store is emptied after the read, matched or not.
    pub async fn query(&self, filter: &LogFilter, drain: bool) -> Vec<ConsoleEntry> {
        let mut entries = self.entries.lock().await;
        let mut matched: Vec<ConsoleEntry> = entries
            .iter()
            .filter(|entry| filter.kind.is_none_or(|kind| entry.kind == kind))
            .filter(|entry| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|needle| entry.text.contains(needle))
            })
            .cloned()
            .collect();
        if let Some(limit) = filter.limit
            && matched.len() > limit
        {
            matched.drain(..matched.len() - limit);
        }
        if drain {
            entries.clear();
        }
        matched
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
