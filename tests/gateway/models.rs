use super::gateway_harness::{GEMMA_PATH, GatewayTestServer, MISTRAL_PATH, config_for, hf_sse};
use serde_json::{Value, json};
use streamchat::catalog::{AgentProfile, JsonFileProfileStore, ModelSummary};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse_ok() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(hf_sse(&["Ok."]))
}

async fn prompt_sent(upstream: &MockServer) -> String {
    let requests = upstream
        .received_requests()
        .await
        .expect("request recording should be enabled");
    let body: Value = requests
        .last()
        .expect("upstream should have been called")
        .body_json()
        .expect("upstream body should be json");
    body["inputs"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn models_endpoint_lists_catalog() {
    let upstream = MockServer::start().await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let models: Vec<ModelSummary> = reqwest::get(server.url("/api/models"))
        .await
        .expect("models request should complete")
        .json()
        .await
        .expect("models response should be json");

    let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["gemma", "mistral", "llama"]);
    let llama = &models[2];
    assert!(!llama.active);
    assert!(llama.coming_soon);
}

#[tokio::test]
async fn health_reports_model_readiness() {
    let upstream = MockServer::start().await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let health: Value = reqwest::get(server.url("/health"))
        .await
        .expect("health request should complete")
        .json()
        .await
        .expect("health response should be json");
    assert_eq!(health["status"], "ok");
    assert_eq!(health["provider"], "huggingface");
    assert_eq!(health["model_ready"], true);
}

#[tokio::test]
async fn agent_profile_and_history_shape_the_prompt() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMMA_PATH))
        .respond_with(sse_ok())
        .mount(&upstream)
        .await;

    let dir = TempDir::new().expect("temp dir should be created");
    let profile_path = dir.path().join("storage.json");
    JsonFileProfileStore::new(&profile_path)
        .save(&AgentProfile {
            name: "Ada".into(),
            instructions: "Answer like a mathematician.".into(),
            rules: "Never guess.".into(),
        })
        .expect("profile should be saved");

    let mut config = config_for(&upstream);
    config.agent_profile_path = Some(profile_path.display().to_string());
    let server = GatewayTestServer::start(config).await;

    let history: Vec<Value> = (1..=6)
        .map(|turn| {
            let role = if turn % 2 == 1 { "user" } else { "assistant" };
            json!({"role": role, "content": format!("turn {turn}")})
        })
        .collect();
    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&json!({
            "message": "prove it",
            "chatHistory": history,
            "modelId": "gemma"
        }))
        .send()
        .await
        .expect("chat request should complete");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let _ = response.text().await;

    let prompt = prompt_sent(&upstream).await;
    assert!(prompt.starts_with("You are Ada.\n\nAnswer like a mathematician."));
    assert!(prompt.contains("Rules:\nNever guess."));
    assert!(!prompt.contains("turn 2\n"));
    assert!(prompt.contains("User: turn 3"));
    assert!(prompt.contains("Assistant: turn 6"));
    assert!(prompt.contains("Current question:\nprove it"));
    assert!(prompt.ends_with("Response:"));
    assert!(!prompt.contains("TOOL_CALL"));
}

#[tokio::test]
async fn tools_stay_off_for_models_without_tool_support() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MISTRAL_PATH))
        .respond_with(sse_ok())
        .mount(&upstream)
        .await;

    let mut config = config_for(&upstream);
    if let Some(mistral) = config.models.iter_mut().find(|m| m.id == "mistral") {
        mistral.supports_tool_call = false;
    }
    let server = GatewayTestServer::start(config).await;

    let body = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&json!({"message": "hi", "modelId": "mistral", "toolsEnabled": true}))
        .send()
        .await
        .expect("chat request should complete")
        .text()
        .await
        .expect("body should be readable");
    assert_eq!(body, "data: Ok.\n\ndata: [DONE]\n\n");

    let prompt = prompt_sent(&upstream).await;
    assert!(!prompt.contains("TOOL_CALL"));
}
