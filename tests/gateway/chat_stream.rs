use super::gateway_harness::{GEMMA_PATH, GatewayTestServer, config_for, hf_sse};
use streamchat::client::ChatClient;
use streamchat::gateway::ChatRequest;
use streamchat::transport::{Segment, classify};
use streamchat::{ChatError, StreamError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

fn ask(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.into(),
        model_id: Some("gemma".into()),
        ..ChatRequest::default()
    }
}

#[tokio::test]
async fn chat_streams_clean_frames_then_done() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMMA_PATH))
        .respond_with(sse(hf_sse(&["Hel", "lo ", "world.<end_of_turn>"])))
        .expect(1)
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let response = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&serde_json::json!({"message": "hi", "modelId": "gemma"}))
        .send()
        .await
        .expect("chat request should complete");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/event-stream"
    );
    let body = response.text().await.expect("body should be readable");
    assert_eq!(body, "data: Hello world.\n\ndata: [DONE]\n\n");
}

#[tokio::test]
async fn request_without_model_uses_first_active_model() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMMA_PATH))
        .respond_with(sse(hf_sse(&["Default ", "model."])))
        .expect(1)
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let body = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&serde_json::json!({"message": "hi"}))
        .send()
        .await
        .expect("chat request should complete")
        .text()
        .await
        .expect("body should be readable");

    assert_eq!(body, "data: Default model.\n\ndata: [DONE]\n\n");
}

#[tokio::test]
async fn client_reassembles_multi_chunk_reply() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMMA_PATH))
        .respond_with(sse(hf_sse(&[
            "Here is code. ",
            "```rust\n",
            "fn main() {}\n",
            "```\n",
            "Done.",
        ])))
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;
    let client = ChatClient::new(&server.base_url());

    let mut payloads = 0;
    let reply = client
        .stream_chat(&ask("show me"), CancellationToken::new(), |_| payloads += 1)
        .await
        .expect("reply should stream");

    assert!(payloads >= 2);
    assert_eq!(reply.content, "Here is code. ```rust\nfn main() {}\n```\nDone.");
    assert_eq!(
        classify(&reply.content),
        vec![
            Segment::Text {
                content: "Here is code. ".into()
            },
            Segment::Code {
                content: "fn main() {}\n".into(),
                language: "rust".into(),
                streaming: false,
            },
            Segment::Text {
                content: "\nDone.".into()
            },
        ]
    );
}

#[tokio::test]
async fn zero_upstream_chunks_surface_as_no_response() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMMA_PATH))
        .respond_with(sse(String::new()))
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let raw = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&ask("hi"))
        .send()
        .await
        .expect("chat request should complete")
        .text()
        .await
        .expect("body should be readable");
    assert_eq!(raw, "data: [DONE]\n\n");

    let error = ChatClient::new(&server.base_url())
        .stream_chat(&ask("hi"), CancellationToken::new(), |_| {})
        .await
        .expect_err("empty reply should fail");
    assert!(matches!(error, ChatError::Stream(StreamError::Empty)));
    assert_eq!(error.to_string(), "stream: model produced no response");
}

#[tokio::test]
async fn tool_directive_is_replaced_by_tool_result() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GEMMA_PATH))
        .respond_with(sse(hf_sse(&[
            "Checking. ",
            r#"TOOL_CALL: {"name":"web_search","arguments":{"query":"rust"}}"#,
            "\n",
        ])))
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "rust"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="result">
                 <a class="result__a" href="https://www.rust-lang.org/">Rust Programming Language</a>
                 <a class="result__snippet">A language empowering everyone.</a>
               </div>"#,
        ))
        .expect(1)
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let request = ChatRequest {
        tools_enabled: true,
        ..ask("what is rust?")
    };
    let reply = ChatClient::new(&server.base_url())
        .stream_chat(&request, CancellationToken::new(), |_| {})
        .await
        .expect("reply should stream");

    assert!(!reply.content.contains("TOOL_CALL"));
    let segments = classify(&reply.content);
    assert_eq!(
        segments.first(),
        Some(&Segment::Text {
            content: "Checking. \n".into()
        })
    );
    let Some(Segment::ToolResult {
        name,
        content,
        streaming,
    }) = segments.get(1)
    else {
        panic!("expected a tool result segment, got {segments:?}");
    };
    assert_eq!(name, "web_search");
    assert!(!streaming);
    assert!(content.contains("Rust Programming Language"));
    assert!(content.contains("https://www.rust-lang.org/"));
}

#[tokio::test]
async fn mid_stream_upstream_error_becomes_error_frame() {
    let upstream = MockServer::start().await;
    let mut body = hf_sse(&["First sentence.", " Second sentence."]);
    body.push_str("data:{\"error\":\"Model overloaded\"}\n\n");
    Mock::given(method("POST"))
        .and(path(GEMMA_PATH))
        .respond_with(sse(body))
        .mount(&upstream)
        .await;
    let server = GatewayTestServer::start(config_for(&upstream)).await;

    let raw = reqwest::Client::new()
        .post(server.url("/api/chat"))
        .json(&ask("hi"))
        .send()
        .await
        .expect("chat request should complete")
        .text()
        .await
        .expect("body should be readable");

    assert!(raw.starts_with("data: First sentence.\n\n"));
    assert!(raw.contains("data: Error: upstream error: Model overloaded\n\n"));
    assert!(raw.ends_with("data: [DONE]\n\n"));
}
