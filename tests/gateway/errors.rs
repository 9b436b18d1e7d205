use super::gateway_harness::{GEMMA_PATH, GatewayTestServer, config_for};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn post_chat(server: &GatewayTestServer, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&body)
        .send()
        .await
        .expect("chat request should complete");
    let status = response.status();
    let body = response.json().await.expect("error response should be json");
    (status, body)
}

/// Upstream that must never be called.
async fn silent_upstream() -> MockServer {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    upstream
}

#[tokio::test]
async fn empty_message_is_rejected_without_upstream_call() {
    let upstream = silent_upstream().await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let (status, body) = post_chat(&server, json!({"message": "", "modelId": "gemma"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "request_validation_error");

    let (status, _) = post_chat(&server, json!({"message": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_chat(&server, json!({"modelId": "gemma"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let upstream = silent_upstream().await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("chat request should complete");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_and_inactive_models_short_circuit() {
    let upstream = silent_upstream().await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let (status, body) = post_chat(&server, json!({"message": "hi", "modelId": "nope"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "configuration_error");

    let (status, body) = post_chat(&server, json!({"message": "hi", "modelId": "llama"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(
        body["details"]
            .as_str()
            .is_some_and(|details| details.contains("llama is not active"))
    );
}

#[tokio::test]
async fn missing_credentials_fail_before_streaming() {
    let upstream = silent_upstream().await;
    let mut config = config_for(&upstream);
    config.api_key = None;
    let server = GatewayTestServer::start(config).await;

    let (status, body) = post_chat(&server, json!({"message": "hi", "modelId": "gemma"})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "configuration_error");
    assert_eq!(
        body["details"],
        "configuration: missing API key for provider huggingface"
    );
}

#[tokio::test]
async fn upstream_rejection_before_first_chunk_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(wiremock::matchers::path(GEMMA_PATH))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": "Rate limit reached"})),
        )
        .expect(1)
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let (status, body) = post_chat(&server, json!({"message": "hi", "modelId": "gemma"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
    assert_eq!(body["status"], 429);
    assert!(
        body["details"]
            .as_str()
            .is_some_and(|details| details.contains("Rate limit reached"))
    );
}
