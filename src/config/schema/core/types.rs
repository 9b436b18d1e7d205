use super::super::{
    GatewayConfig, ModelEntry, ObservabilityConfig, PipelineConfig, ToolsConfig, default_models,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

/// Which remote inference API the adapter speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    Huggingface,
    OpenaiCompatible,
}

impl ProviderKind {
    /// Base URL used when none is configured.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Huggingface => "https://api-inference.huggingface.co",
            Self::OpenaiCompatible => "http://127.0.0.1:8000",
        }
    }
}

pub(crate) const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful and knowledgeable assistant. Follow these rules:
1. Give direct, clear answers
2. Be concise and to the point
3. Don't add unnecessary pleasantries or questions
4. For math or coding, just show the solution
5. Don't ask if there's anything else you can help with";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    pub api_key: Option<String>,
    #[serde(default)]
    pub provider: ProviderKind,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// JSON key-value file holding the agent profile (tilde expanded)
    pub agent_profile_path: Option<String>,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default = "default_models")]
    pub models: Vec<ModelEntry>,
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            api_key: None,
            provider: ProviderKind::default(),
            base_url: None,
            system_prompt: default_system_prompt(),
            agent_profile_path: None,
            observability: ObservabilityConfig::default(),
            gateway: GatewayConfig::default(),
            pipeline: PipelineConfig::default(),
            tools: ToolsConfig::default(),
            models: default_models(),
        }
    }
}

impl Config {
    /// Endpoint root for the configured provider.
    pub fn effective_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Agent profile file with `~` and `$VARS` expanded.
    pub fn agent_profile_path(&self) -> Option<PathBuf> {
        let raw = self.agent_profile_path.as_deref()?;
        let expanded = shellexpand::full(raw)
            .map_or_else(|_| raw.to_string(), std::borrow::Cow::into_owned);
        Some(PathBuf::from(expanded))
    }
}
