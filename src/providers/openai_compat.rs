use super::http_client::build_provider_client_with_timeout;
use super::sse::event_stream;
use super::traits::{ChatModel, GenerationParams, RawStream};
use crate::error::ChatError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Any server exposing the OpenAI `/v1/completions` text API
/// (vLLM, llama.cpp server, TGI's compatibility layer).
pub struct OpenAiCompatibleModel {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop: &'a [String],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl OpenAiCompatibleModel {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            client: build_provider_client_with_timeout(timeout_secs),
        }
    }

    async fn send(
        &self,
        prompt: &str,
        params: &GenerationParams,
        stream: bool,
    ) -> Result<reqwest::Response, ChatError> {
        let request = CompletionRequest {
            model: &params.model,
            prompt,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stop: &params.stop,
            stream,
        };

        let mut builder = self
            .client
            .post(format!("{}/v1/completions", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(super::api_error("OpenAI-compatible", response).await);
        }
        Ok(response)
    }
}

fn parse_event(data: &str) -> Option<Result<String, ChatError>> {
    if data.trim() == "[DONE]" {
        return None;
    }
    let event: CompletionResponse = serde_json::from_str(data).ok()?;
    if let Some(error) = event.error {
        return Some(Err(ChatError::upstream(
            None,
            super::sanitize_api_error(&error.message),
        )));
    }
    let text: String = event.choices.into_iter().map(|choice| choice.text).collect();
    (!text.is_empty()).then_some(Ok(text))
}

#[async_trait]
impl ChatModel for OpenAiCompatibleModel {
    fn name(&self) -> &str {
        "openai-compatible"
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
        let body: CompletionResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(ChatError::upstream(None, error.message));
        }
        Ok(body.choices.into_iter().map(|choice| choice.text).collect())
    }
}
