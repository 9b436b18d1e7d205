use serde::{Deserialize, Serialize};

/// Opening marker of a tool-result block inside the chunk stream.
pub const TOOL_RESULT_OPEN: &str = "[[tool_result:";
/// Closing marker of a tool-result block inside the chunk stream.
pub const TOOL_RESULT_CLOSE: &str = "[[/tool_result]]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Text,
    ToolResult,
}

/// A cleaned unit of assistant output, ready for transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub text: String,
    /// Set only on the terminal chunk of a response.
    #[serde(default)]
    pub last: bool,
}

impl Chunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: ChunkKind::Text,
            text: text.into(),
            last: false,
        }
    }

    /// Build a demarcated tool-result chunk.
    ///
    /// The payload is wrapped as
    /// `\n[[tool_result:<name>]]\n<body>\n[[/tool_result]]\n` so the receiving
    /// side can split it from surrounding prose.
    pub fn tool_result(name: &str, body: &str) -> Self {
        Self {
            kind: ChunkKind::ToolResult,
            text: format!("\n{TOOL_RESULT_OPEN}{name}]]\n{body}\n{TOOL_RESULT_CLOSE}\n"),
            last: false,
        }
    }

    pub fn is_tool_result(&self) -> bool {
        self.kind == ChunkKind::ToolResult
    }

    #[must_use]
    pub fn into_last(mut self) -> Self {
        self.last = true;
        self
    }
}

/// Concatenate chunk texts in order.
pub fn concat_text(chunks: &[Chunk]) -> String {
    chunks.iter().map(|chunk| chunk.text.as_str()).collect()
}
