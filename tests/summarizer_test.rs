//! Anthropic summarizer against a mocked Messages API.

use secrecy::SecretString;
use serde_json::json;
use shotwatch::config::settings::AnthropicSettings;
use shotwatch::error::Error;
use shotwatch::llm::{AnthropicSummarizer, RetryPolicy, Summarizer};
use shotwatch::model::{Screenshot, ScreenshotEvent};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn summarizer(server: &MockServer, attempts: u32) -> AnthropicSummarizer {
    let settings = AnthropicSettings {
        base_url: server.uri(),
        model: "claude-test".to_string(),
        max_tokens: 200,
        timeout_secs: 5,
    };
    AnthropicSummarizer::new(
        SecretString::from("sk-test"),
        &settings,
        RetryPolicy::immediate(attempts),
    )
    .unwrap()
}

fn screenshot() -> Screenshot {
    Screenshot::new(
        ScreenshotEvent::new("/shots/Screenshot 2024-05-01 at 10.00.00.png"),
        vec![0x89, b'P', b'N', b'G'],
    )
}

fn ok_body(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "model": "claude-test",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn",
        "stop_sequence": null,
        "usage": { "input_tokens": 1500, "output_tokens": 12 }
    })
}

fn error_body(kind: &str, message: &str) -> serde_json::Value {
    json!({ "type": "error", "error": { "type": kind, "message": message } })
}

#[tokio::test]
async fn summarize_sends_image_and_returns_first_text_block() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(body_partial_json(json!({ "model": "claude-test", "max_tokens": 200 })))
        .and(body_string_contains("\"media_type\":\"image/png\""))
        .and(body_string_contains("iVBORw=="))
        .and(body_string_contains("concise summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("  User viewing a spreadsheet \n")))
        .expect(1)
        .mount(&server)
        .await;

    let text = summarizer(&server, 3).summarize(&screenshot()).await.unwrap();
    assert_eq!(text, "User viewing a spreadsheet");
}

#[tokio::test]
async fn overloaded_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(529).set_body_json(error_body("overloaded_error", "Overloaded")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("Code editor")))
        .expect(1)
        .mount(&server)
        .await;

    let text = summarizer(&server, 3).summarize(&screenshot()).await.unwrap();
    assert_eq!(text, "Code editor");
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(error_body("authentication_error", "invalid x-api-key")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = summarizer(&server, 3)
        .summarize(&screenshot())
        .await
        .unwrap_err();
    match err {
        Error::Api { service, status, body } => {
            assert_eq!(service, "anthropic");
            assert_eq!(status, 401);
            assert!(body.contains("invalid"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn persistent_server_errors_exhaust_retries() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body("api_error", "Internal server error")))
        .expect(3)
        .mount(&server)
        .await;

    let err = summarizer(&server, 3)
        .summarize(&screenshot())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }), "{err:?}");
}

#[tokio::test]
async fn response_without_text_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_02",
            "type": "message",
            "role": "assistant",
            "model": "claude-test",
            "content": [{ "type": "tool_use", "id": "t1", "name": "x", "input": {} }],
            "stop_reason": "tool_use",
            "stop_sequence": null,
            "usage": { "input_tokens": 10, "output_tokens": 3 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(summarizer(&server, 3).summarize(&screenshot()).await.is_err());
}
