use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::oneshot;
use tokio::time::Instant;
use wildmatch::WildMatch;

use crate::CoreError;
use crate::Result;

/// What a resolved wait captured from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    pub url: String,
    pub status: u16,
    /// Prefix of the response body, truncated to the configured budget.
    /// `None` when the backend could not produce one.
    pub body: Option<String>,
}

struct PendingWait {
    pattern: String,
    armed_at: Instant,
    /// Taken by the observer when the first matching response arrives.
    tx: Option<oneshot::Sender<CapturedResponse>>,
    /// Taken by the consuming assert.
    rx: Option<oneshot::Receiver<CapturedResponse>>,
}

/// Pairs non-blocking "expect a response" registrations with later blocking
/// asserts on the same caller-supplied id. Resolution is pushed in by the
/// page event pump; consumption removes the wait whatever the outcome.
pub struct ResponseCorrelator {
    window: Duration,
    body_limit: usize,
    waits: Mutex<HashMap<String, PendingWait>>,
}

impl ResponseCorrelator {
    pub fn new(window_ms: u64, body_limit: usize) -> Self {
        Self {
            window: Duration::from_millis(window_ms),
            body_limit,
            waits: Mutex::new(HashMap::new()),
        }
    }

    /// Arms a wait. Never blocks; the id stays reserved until a matching
    /// assert consumes it.
    pub async fn expect(&self, id: &str, pattern: &str) -> Result<()> {
        let mut waits = self.waits.lock().await;
        if waits.contains_key(id) {
            return Err(CoreError::DuplicateWait(id.to_string()));
        }
        let (tx, rx) = oneshot::channel();
        waits.insert(
            id.to_string(),
            PendingWait {
                pattern: pattern.to_string(),
                armed_at: Instant::now(),
                tx: Some(tx),
                rx: Some(rx),
            },
        );
        Ok(())
    }

    /// Feeds one observed network response to every armed, unexpired wait
    /// whose pattern matches the URL.
    pub async fn observe(&self, url: &str, status: u16, body: Option<&str>) {
        let mut waits = self.waits.lock().await;
        for wait in waits.values_mut() {
            if wait.tx.is_none()
                || wait.armed_at.elapsed() > self.window
                || !pattern_matches(&wait.pattern, url)
            {
                continue;
            }
            let captured = CapturedResponse {
                url: url.to_string(),
                status,
                body: body.map(|b| truncate_snippet(b, self.body_limit)),
            };
            if let Some(tx) = wait.tx.take() {
                // Receiver may already be gone if the wait was dropped
                // mid-assert; nothing to do then.
                let _ = tx.send(captured);
            }
        }
    }

    /// Blocks until the wait resolves or its window (measured from the
    /// expect call) runs out, then consumes it. A second assert on the same
    /// id reports an unknown wait.
    pub async fn assert(&self, id: &str, fragment: Option<&str>) -> Result<CapturedResponse> {
        let (rx, pattern, deadline) = {
            let mut waits = self.waits.lock().await;
            let Some(wait) = waits.get_mut(id) else {
                return Err(CoreError::UnknownWait(id.to_string()));
            };
            let Some(rx) = wait.rx.take() else {
                return Err(CoreError::UnknownWait(id.to_string()));
            };
            (rx, wait.pattern.clone(), wait.armed_at + self.window)
        };

        let outcome = tokio::time::timeout_at(deadline, rx).await;
        self.waits.lock().await.remove(id);

        let captured = match outcome {
            Ok(Ok(captured)) => captured,
            // Sender dropped without resolving (browser closed) or window
            // elapsed; both mean no matching response was seen.
            Ok(Err(_)) | Err(_) => return Err(CoreError::ResponseTimeout { pattern }),
        };

        if let Some(fragment) = fragment {
            let body = captured.body.as_deref().unwrap_or("");
            if !body.contains(fragment) {
                return Err(CoreError::ResponseMismatch {
                    fragment: fragment.to_string(),
                    body: body.to_string(),
                });
            }
        }
        Ok(captured)
    }

    /// Drops every wait; in-flight asserts resolve as timeouts. Called when
    /// the page they were scoped to goes away.
    pub async fn clear(&self) {
        self.waits.lock().await.clear();
    }

    pub async fn pending_count(&self) -> usize {
        self.waits.lock().await.len()
    }
}

/// True when `url` contains `pattern` as a substring or matches it as a
/// `*`/`?` glob. Shared with URL waits so both match the same way.
pub fn pattern_matches(pattern: &str, url: &str) -> bool {
    url.contains(pattern) || WildMatch::new(pattern).matches(url)
}

fn truncate_snippet(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }
    let mut end = limit;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn resolves_when_response_observed_before_assert() {
        let correlator = ResponseCorrelator::new(1000, 4096);
        correlator.expect("w1", "/api/users").await.unwrap();
        correlator
            .observe("https://x.test/api/users?page=2", 200, Some("{\"ok\":true}"))
            .await;
        let captured = correlator.assert("w1", None).await.unwrap();
        assert_eq!(captured.status, 200);
        assert_eq!(captured.body.as_deref(), Some("{\"ok\":true}"));
    }

    #[tokio::test]
    async fn wait_is_consumed_by_assert() {
        let correlator = ResponseCorrelator::new(1000, 4096);
        correlator.expect("w1", "users").await.unwrap();
        correlator.observe("https://x.test/users", 200, None).await;
        correlator.assert("w1", None).await.unwrap();
        let err = correlator.assert("w1", None).await.unwrap_err();
        assert!(matches!(err, CoreError::UnknownWait(_)));
    }

    #[tokio::test]
    async fn duplicate_expect_is_rejected() {
        let correlator = ResponseCorrelator::new(1000, 4096);
        correlator.expect("w1", "a").await.unwrap();
        let err = correlator.expect("w1", "b").await.unwrap_err();
        assert!(matches!(err, CoreError::DuplicateWait(_)));
        assert_eq!(correlator.pending_count().await, 1);
    }

    #[tokio::test]
    async fn fragment_mismatch_reports_captured_body() {
        let correlator = ResponseCorrelator::new(1000, 4096);
        correlator.expect("w1", "orders").await.unwrap();
        correlator
            .observe("https://x.test/orders", 200, Some("{\"total\":3}"))
            .await;
        let err = correlator.assert("w1", Some("total\":9")).await.unwrap_err();
        match err {
            CoreError::ResponseMismatch { body, .. } => assert_eq!(body, "{\"total\":3}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn glob_pattern_matches_full_url() {
        let correlator = ResponseCorrelator::new(1000, 4096);
        correlator.expect("w1", "*/api/*/detail").await.unwrap();
        correlator
            .observe("https://x.test/api/items/detail", 204, None)
            .await;
        let captured = correlator.assert("w1", None).await.unwrap();
        assert_eq!(captured.status, 204);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_wait_reports_timeout() {
        let correlator = ResponseCorrelator::new(50, 4096);
        correlator.expect("w1", "never").await.unwrap();
        tokio::time::advance(Duration::from_millis(60)).await;
        let err = correlator.assert("w1", None).await.unwrap_err();
        assert!(matches!(err, CoreError::ResponseTimeout { .. }));
        assert_eq!(correlator.pending_count().await, 0);
    }
}
