//! Conversation model and prompt construction.

use crate::error::ConfigurationError;
use crate::pipeline::DIRECTIVE_MARKER;
use crate::tools::ToolSpec;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub const RESPONSE_CUE: &str = "Response:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    fn label(self) -> &'static str {
        match self {
            Self::System => "System:",
            Self::User => "User:",
            Self::Assistant => "Assistant:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One request's conversation: an optional system message, prior turns, and
/// the current user message. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    system: Option<String>,
    history: Vec<Message>,
    current: String,
}

impl Conversation {
    /// System entries inside `history` are discarded; only `system` is kept.
    pub fn new(system: Option<String>, history: Vec<Message>, current: impl Into<String>) -> Self {
        Self {
            system: system.filter(|text| !text.trim().is_empty()),
            history: history
                .into_iter()
                .filter(|message| message.role != Role::System)
                .collect(),
            current: current.into(),
        }
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// The most recent `window` prior turns.
    pub fn recent_history(&self, window: usize) -> &[Message] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }
}

/// Prompt layout knobs for one model.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub model_id: String,
    pub history_window: usize,
    /// Tera template replacing the built-in layout
    pub template: Option<String>,
}

/// Instructions listing each tool and the directive syntax.
pub fn tool_preamble(tools: &[ToolSpec]) -> String {
    let mut lines = vec![
        "You can use tools. To call one, write a single line of the form".to_string(),
        format!("{DIRECTIVE_MARKER} {{\"name\": \"<tool>\", \"arguments\": {{...}}}}"),
        "and the result will be inserted into your answer. Available tools:".to_string(),
    ];
    for tool in tools {
        lines.push(format!(
            "- {}: {} Parameters: {}",
            tool.name,
            tool.description,
            tool.parameter_names().join(", ")
        ));
    }
    lines.join("\n")
}

fn default_layout(conversation: &Conversation, tools: &[ToolSpec], window: usize) -> String {
    let mut sections = Vec::new();
    if !tools.is_empty() {
        sections.push(tool_preamble(tools));
    }
    if let Some(system) = conversation.system() {
        sections.push(system.to_string());
    }

    let recent = conversation.recent_history(window);
    if !recent.is_empty() {
        let turns: Vec<String> = recent
            .iter()
            .map(|message| format!("{} {}", message.role.label(), message.content))
            .collect();
        sections.push(format!("Previous conversation:\n{}", turns.join("\n")));
    }

    sections.push(format!("Current question:\n{}", conversation.current()));
    sections.push(RESPONSE_CUE.to_string());
    sections.join("\n\n")
}

#[derive(Serialize)]
struct TemplateTool<'a> {
    name: &'a str,
    description: &'a str,
    parameters: Vec<&'a str>,
}

fn render_template(
    template: &str,
    conversation: &Conversation,
    tools: &[ToolSpec],
    options: &PromptOptions,
) -> Result<String, ConfigurationError> {
    let mut context = tera::Context::new();
    let tools: Vec<TemplateTool<'_>> = tools
        .iter()
        .map(|tool| TemplateTool {
            name: &tool.name,
            description: &tool.description,
            parameters: tool.parameter_names(),
        })
        .collect();
    context.insert("tools", &tools);
    context.insert("system", conversation.system().unwrap_or_default());
    context.insert(
        "history",
        conversation.recent_history(options.history_window),
    );
    context.insert("message", conversation.current());

    tera::Tera::one_off(template, &context, false).map_err(|error| {
        ConfigurationError::PromptTemplate {
            model: options.model_id.clone(),
            message: error.to_string(),
        }
    })
}

/// Build the single prompt string sent upstream.
pub fn build_prompt(
    conversation: &Conversation,
    tools: &[ToolSpec],
    options: &PromptOptions,
) -> Result<String, ConfigurationError> {
    match options.template.as_deref() {
        Some(template) => render_template(template, conversation, tools, options),
        None => Ok(default_layout(conversation, tools, options.history_window)),
    }
}
