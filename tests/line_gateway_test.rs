//! LINE push gateway against a mock Messaging API

mod helpers;

use std::time::Duration;
use planly::services::{LineMessagingGateway, NotificationGateway};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUSH_PATH: &str = "/v2/bot/message/push";

async fn gateway(server: &MockServer) -> LineMessagingGateway {
    let mut settings = helpers::test_settings();
    settings.line.push_api_url = format!("{}{}", server.uri(), PUSH_PATH);
    settings.notifications.per_second = 1000;
    settings.notifications.max_retries = 2;
    settings.notifications.timeout_seconds = 5;

    LineMessagingGateway::new(&settings.line, &settings.notifications)
        .unwrap()
        .with_retry_backoff(Duration::from_millis(1))
}

#[tokio::test]
async fn test_push_message_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "to": "U2",
            "messages": [{"type": "text", "text": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let report = gateway(&server).await.send("U2", "hello").await;
    assert!(report.delivered);
    assert_eq!(report.error, None);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let report = gateway(&server).await.send("U2", "hello").await;
    assert!(report.delivered);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let report = gateway(&server).await.send("U2", "hello").await;
    assert!(!report.delivered);
    assert!(report.error.unwrap().contains("503"));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("The property, 'to', in the request body is invalid"))
        .expect(1)
        .mount(&server)
        .await;

    let report = gateway(&server).await.send("not-a-user", "hello").await;
    assert!(!report.delivered);
    let error = report.error.unwrap();
    assert!(error.contains("400"));
    assert!(error.contains("invalid"));
}

#[tokio::test]
async fn test_long_text_is_truncated() {
    let server = MockServer::start().await;
    let long_text = "あ".repeat(6000);
    let expected = format!("{}...", "あ".repeat(4997));
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(body_json(json!({
            "to": "U2",
            "messages": [{"type": "text", "text": expected}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let report = gateway(&server).await.send("U2", &long_text).await;
    assert!(report.delivered);
}
