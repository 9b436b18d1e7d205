use crate::error::ChatError;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Raw text fragments as they arrive from the inference endpoint.
pub type RawStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// Per-request sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Model identifier on the remote endpoint
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

impl GenerationParams {
    pub fn from_entry(entry: &crate::config::ModelEntry) -> Self {
        Self {
            model: entry.upstream_model.clone(),
            temperature: entry.temperature,
            max_tokens: entry.max_tokens,
            stop: entry.stop_tokens.clone(),
        }
    }
}

/// A remote text-generation endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn name(&self) -> &str;

    /// Open a streaming generation.
    ///
    /// Fails without yielding when the endpoint rejects the request; once the
    /// stream is returned, later failures arrive as stream items. The stream
    /// ends early when `cancel` fires.
    async fn stream_raw(
        &self,
        prompt: &str,
        params: &GenerationParams,
        cancel: CancellationToken,
    ) -> Result<RawStream, ChatError>;

    /// Single-shot generation returning the whole completion.
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String, ChatError>;
}
