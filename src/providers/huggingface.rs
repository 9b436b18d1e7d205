use super::http_client::build_provider_client_with_timeout;
use super::sse::event_stream;
use super::traits::{ChatModel, GenerationParams, RawStream};
use crate::error::ChatError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Hugging Face Inference API (text-generation-inference backends).
pub struct HuggingFaceModel {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: Parameters<'a>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Parameters<'a> {
    temperature: f64,
    max_new_tokens: u32,
    return_full_text: bool,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    token: Option<Token>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Token {
    text: String,
}

impl HuggingFaceModel {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: build_provider_client_with_timeout(timeout_secs),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}", self.base_url)
    }

    async fn send(
        &self,
        prompt: &str,
        params: &GenerationParams,
        stream: bool,
    ) -> Result<reqwest::Response, ChatError> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: Parameters {
                temperature: params.temperature,
                max_new_tokens: params.max_tokens,
                return_full_text: false,
                stop: &params.stop,
            },
            stream,
        };

        let response = self
            .client
            .post(self.endpoint(&params.model))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(super::api_error("Hugging Face", response).await);
        }
        Ok(response)
    }
}

/// Token text carried by one TGI stream event, or the in-band error.
fn parse_event(data: &str) -> Option<Result<String, ChatError>> {
    let event: StreamEvent = match serde_json::from_str(data) {
        Ok(event) => event,
        Err(error) => {
            tracing::debug!("Skipping unparseable stream event: {error}");
            return None;
        }
    };
    if let Some(error) = event.error {
        return Some(Err(ChatError::upstream(
            None,
            super::sanitize_api_error(&error),
        )));
    }
    event.token.map(|token| Ok(token.text))
}

#[async_trait]
impl ChatModel for HuggingFaceModel {
    fn name(&self) -> &str {
        "huggingface"
    }

    async fn stream_raw(
        &self,
        prompt: &str,
        params: &GenerationParams,
        cancel: CancellationToken,
    ) -> Result<RawStream, ChatError> {
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            response = self.send(prompt, params, true) => response?,
        };
        Ok(event_stream(response, cancel, parse_event))
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, ChatError> {
        let response = self.send(prompt, params, false).await?;
        let generations: Vec<Generation> = response.json().await?;
        Ok(generations
            .into_iter()
            .next()
            .map(|generation| generation.generated_text)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params() -> GenerationParams {
        GenerationParams {
            model: "google/gemma-2b-it".into(),
            temperature: 0.7,
            max_tokens: 500,
            stop: vec!["<end_of_turn>".into()],
        }
    }

    fn sse_body(tokens: &[&str]) -> String {
        tokens
            .iter()
            .map(|text| {
                format!(
                    "data:{}\n\n",
                    serde_json::json!({"token": {"id": 1, "text": text, "special": false}})
                )
            })
            .collect()
    }

    #[test]
    fn parse_event_extracts_token_text_and_errors() {
        assert_eq!(
            parse_event(r#"{"token":{"text":"Hi","special":false}}"#)
                .unwrap()
                .unwrap(),
            "Hi"
        );
        assert!(matches!(
            parse_event(r#"{"error":"Input validation error"}"#),
            Some(Err(ChatError::Upstream { .. }))
        ));
        assert!(parse_event("not json").is_none());
    }

    #[tokio::test]
    async fn stream_raw_yields_token_texts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/google/gemma-2b-it"))
            .and(header("authorization", "Bearer hf_test"))
            .and(body_partial_json(serde_json::json!({
                "stream": true,
                "parameters": {"max_new_tokens": 500, "return_full_text": false}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&["Hel", "lo", " world."])),
            )
            .mount(&server)
            .await;

        let model = HuggingFaceModel::new(&server.uri(), "hf_test", 30);
        let stream = model
            .stream_raw("prompt", &params(), CancellationToken::new())
            .await
            .unwrap();
        let texts: Vec<String> = stream.try_collect().await.unwrap();
        assert_eq!(texts, vec!["Hel", "lo", " world."]);
    }

    #[tokio::test]
    async fn stream_raw_fails_before_streaming_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let model = HuggingFaceModel::new(&server.uri(), "hf_test", 30);
        let Err(error) = model
            .stream_raw("prompt", &params(), CancellationToken::new())
            .await
        else {
            panic!("expected upstream error");
        };
        assert!(matches!(error, ChatError::Upstream { status: Some(429), .. }));
        assert!(error.to_string().contains("rate limited"));
    }

    #[tokio::test]
    async fn cancelled_before_send_is_cancellation() {
        let model = HuggingFaceModel::new("http://127.0.0.1:9", "hf_test", 30);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let Err(error) = model.stream_raw("prompt", &params(), cancel).await else {
            panic!("expected cancellation");
        };
        assert!(error.is_cancellation());
    }

    #[tokio::test]
    async fn complete_returns_generated_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"generated_text": "Hello there."}])),
            )
            .mount(&server)
            .await;

        let model = HuggingFaceModel::new(&server.uri(), "hf_test", 30);
        assert_eq!(model.complete("prompt", &params()).await.unwrap(), "Hello there.");
    }
}
