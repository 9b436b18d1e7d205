use serde::{Deserialize, Serialize};

/// One model catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    /// Model identifier on the inference endpoint
    #[serde(default)]
    pub upstream_model: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub coming_soon: bool,
    /// Tera template overriding the built-in prompt layout
    #[serde(default)]
    pub prompt_template: Option<String>,
    /// Extra stop sequences, also stripped from output
    #[serde(default)]
    pub stop_tokens: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub supports_tool_call: bool,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn features(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

pub fn default_models() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            id: "gemma".into(),
            name: "Gemma".into(),
            description: "Google's lightweight and capable model".into(),
            features: features(&["Fast responses", "Efficient processing", "Helpful assistant"]),
            upstream_model: "google/gemma-2b-it".into(),
            active: true,
            coming_soon: false,
            prompt_template: None,
            stop_tokens: vec!["<end_of_turn>".into()],
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            supports_tool_call: true,
        },
        ModelEntry {
            id: "mistral".into(),
            name: "Mistral".into(),
            description: "Fast and efficient open source model".into(),
            features: features(&["Quick thinking", "Accurate responses", "Low latency"]),
            upstream_model: "mistralai/Mistral-Nemo-Instruct-2407".into(),
            active: true,
            coming_soon: false,
            prompt_template: None,
            stop_tokens: vec!["</s>".into()],
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            supports_tool_call: true,
        },
        ModelEntry {
            id: "llama".into(),
            name: "Llama 2".into(),
            description: "Meta's powerful open source model".into(),
            features: features(&["Strong reasoning", "Code generation", "Complex tasks"]),
            upstream_model: "meta-llama/Llama-2-7b-chat-hf".into(),
            active: false,
            coming_soon: true,
            prompt_template: None,
            stop_tokens: Vec::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            supports_tool_call: false,
        },
    ]
}
