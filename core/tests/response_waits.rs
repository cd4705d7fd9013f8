#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use core_test_support::FakeDriver;
use core_test_support::StubBackend;
use core_test_support::test_dispatcher;
use pagehand_core::CoreConfig;
use pagehand_core::Dispatcher;
use pagehand_core::ToolCall;
use pagehand_core::driver::PageEvent;
use pretty_assertions::assert_eq;
use serde_json::json;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn armed_wait_resolves_from_a_page_response() {
    let driver = FakeDriver::new();
    let dispatcher = test_dispatcher(driver.clone());
    dispatcher
        .dispatch(&ToolCall::new(
            "browser.navigate",
            json!({"url": "https://a.test"}),
        ))
        .await;

    let armed = dispatcher
        .dispatch(&ToolCall::new(
            "browser.expect_response",
            json!({"id": "w1", "url": "/api/users"}),
        ))
        .await;
    assert!(armed.success);
    assert_eq!(
        armed.messages,
        vec!["Started waiting for response matching: /api/users (id: w1)"]
    );

    driver.last_page().emit(PageEvent::Response {
        url: "https://a.test/api/users?page=2".to_string(),
        status: 200,
        body: Some("{\"users\":[]}".to_string()),
    });
    settle().await;

    let asserted = dispatcher
        .dispatch(&ToolCall::new(
            "browser.assert_response",
            json!({"id": "w1"}),
        ))
        .await;
    assert!(asserted.success, "{:?}", asserted.messages);
    assert_eq!(
        asserted.messages,
        vec![
            "Response assertion passed (id: w1)",
            "URL: https://a.test/api/users?page=2",
            "Status: 200",
        ]
    );
}

#[tokio::test]
async fn body_fragment_is_checked_on_assert() {
    let driver = FakeDriver::new();
    let dispatcher = test_dispatcher(driver.clone());
    dispatcher
        .dispatch(&ToolCall::new(
            "browser.navigate",
            json!({"url": "https://a.test"}),
        ))
        .await;

    dispatcher
        .dispatch(&ToolCall::new(
            "browser.expect_response",
            json!({"id": "orders", "url": "*/orders"}),
        ))
        .await;
    driver.last_page().emit(PageEvent::Response {
        url: "https://a.test/orders".to_string(),
        status: 200,
        body: Some("{\"total\":3}".to_string()),
    });
    settle().await;

    let mismatch = dispatcher
        .dispatch(&ToolCall::new(
            "browser.assert_response",
            json!({"id": "orders", "value": "total\":9"}),
        ))
        .await;
    assert!(mismatch.is_error);
    assert_eq!(
        mismatch.messages,
        vec![
            "Response body does not contain expected value: total\":9. Body was: {\"total\":3}"
        ]
    );
}

#[tokio::test]
async fn duplicate_wait_ids_are_rejected() {
    let driver = FakeDriver::new();
    let dispatcher = test_dispatcher(driver.clone());
    dispatcher
        .dispatch(&ToolCall::new(
            "browser.navigate",
            json!({"url": "https://a.test"}),
        ))
        .await;

    dispatcher
        .dispatch(&ToolCall::new(
            "browser.expect_response",
            json!({"id": "w1", "url": "/first"}),
        ))
        .await;
    let second = dispatcher
        .dispatch(&ToolCall::new(
            "browser.expect_response",
            json!({"id": "w1", "url": "/second"}),
        ))
        .await;
    assert!(second.is_error);
    assert_eq!(
        second.messages,
        vec!["A response wait with id w1 is already pending"]
    );

    // The rejected arm must not have replaced the original pattern.
    driver.last_page().emit(PageEvent::Response {
        url: "https://a.test/first".to_string(),
        status: 200,
        body: None,
    });
    settle().await;
    let asserted = dispatcher
        .dispatch(&ToolCall::new(
            "browser.assert_response",
            json!({"id": "w1"}),
        ))
        .await;
    assert!(asserted.success, "{:?}", asserted.messages);
}

#[tokio::test]
async fn assert_on_an_unknown_id_reports_it() {
    let driver = FakeDriver::new();
    let dispatcher = test_dispatcher(driver.clone());

    let result = dispatcher
        .dispatch(&ToolCall::new(
            "browser.assert_response",
            json!({"id": "nope"}),
        ))
        .await;
    assert!(result.is_error);
    assert_eq!(
        result.messages,
        vec!["No response wait registered with id: nope"]
    );
}

#[tokio::test(start_paused = true)]
async fn assert_times_out_when_nothing_matches() {
    let driver = FakeDriver::new();
    let config = CoreConfig {
        response_window_ms: 50,
        ..CoreConfig::default()
    };
    let dispatcher = Dispatcher::new(driver.clone(), Arc::new(StubBackend::new()), config);

    dispatcher
        .dispatch(&ToolCall::new(
            "browser.expect_response",
            json!({"id": "w1", "url": "*/never"}),
        ))
        .await;
    tokio::time::advance(Duration::from_millis(60)).await;

    let result = dispatcher
        .dispatch(&ToolCall::new(
            "browser.assert_response",
            json!({"id": "w1"}),
        ))
        .await;
    assert!(result.is_error);
    assert_eq!(
        result.messages,
        vec!["Timed out waiting for response matching: */never"]
    );
}

#[tokio::test]
async fn relaunch_cancels_pending_waits() {
    let driver = FakeDriver::new();
    let dispatcher = test_dispatcher(driver.clone());
    dispatcher
        .dispatch(&ToolCall::new(
            "browser.navigate",
            json!({"url": "https://a.test"}),
        ))
        .await;
    dispatcher
        .dispatch(&ToolCall::new(
            "browser.expect_response",
            json!({"id": "w1", "url": "/api"}),
        ))
        .await;

    dispatcher
        .dispatch(&ToolCall::new(
            "browser.navigate",
            json!({"url": "https://a.test", "width": 800, "height": 600}),
        ))
        .await;
    assert_eq!(driver.launch_count(), 2);

    let result = dispatcher
        .dispatch(&ToolCall::new(
            "browser.assert_response",
            json!({"id": "w1"}),
        ))
        .await;
    assert!(result.is_error);
    assert_eq!(
        result.messages,
        vec!["No response wait registered with id: w1"]
    );
}
