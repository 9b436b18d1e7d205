use super::huggingface::HuggingFaceModel;
use super::openai_compat::OpenAiCompatibleModel;
use super::traits::ChatModel;
use crate::config::{Config, ProviderKind};
use crate::error::ConfigurationError;
use std::sync::Arc;

/// Build the inference client selected in config.
///
/// Hugging Face always needs a key; OpenAI-compatible servers are often
/// local and may run without one.
pub fn create_chat_model(config: &Config) -> Result<Arc<dyn ChatModel>, ConfigurationError> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty());
    let base_url = config.effective_base_url();
    let timeout = config.pipeline.upstream_timeout_secs;

    match config.provider {
        ProviderKind::Huggingface => {
            let api_key = api_key.ok_or_else(|| ConfigurationError::MissingCredentials {
                provider: ProviderKind::Huggingface.to_string(),
            })?;
            Ok(Arc::new(HuggingFaceModel::new(&base_url, api_key, timeout)))
        }
        ProviderKind::OpenaiCompatible => Ok(Arc::new(OpenAiCompatibleModel::new(
            &base_url, api_key, timeout,
        ))),
    }
}
