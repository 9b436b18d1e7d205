//! Prose / code / tool-result classification of a message that is still
//! growing.
//!
//! [`classify`] is a pure function of the text seen so far, so callers simply
//! re-run it after every reassembled payload. [`FenceParser`] wraps it with
//! the accumulated buffer for one assistant message.

use crate::pipeline::{TOOL_RESULT_CLOSE, TOOL_RESULT_OPEN};
use serde::Serialize;

pub const FENCE: &str = "```";
/// Language reported for fences without an info string.
pub const DEFAULT_LANGUAGE: &str = "plaintext";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text {
        content: String,
    },
    Code {
        content: String,
        language: String,
        /// The closing fence has not arrived yet.
        streaming: bool,
    },
    ToolResult {
        name: String,
        content: String,
        streaming: bool,
    },
}

impl Segment {
    pub fn is_streaming(&self) -> bool {
        match self {
            Self::Text { .. } => false,
            Self::Code { streaming, .. } | Self::ToolResult { streaming, .. } => *streaming,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Text { content } | Self::Code { content, .. } | Self::ToolResult { content, .. } => {
                content
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FenceMode {
    #[default]
    Prose,
    Code,
    ToolResult,
}

/// Where the message tail currently sits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceParseState {
    pub mode: FenceMode,
    /// Info string of an open fence whose first line has not ended yet.
    pub pending_language: Option<String>,
    pub accumulated: String,
}

/// Drop a suffix that could be the start of `marker`, so half-received
/// markers never show up as content.
fn trim_partial_marker<'a>(text: &'a str, marker: &str) -> &'a str {
    for len in (1..marker.len()).rev() {
        if text.ends_with(&marker[..len]) {
            return &text[..text.len() - len];
        }
    }
    text
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if !text.is_empty() {
        segments.push(Segment::Text {
            content: text.to_string(),
        });
    }
}

fn language_of(info: &str) -> String {
    let info = info.trim();
    if info.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        info.to_string()
    }
}

struct Scan {
    segments: Vec<Segment>,
    mode: FenceMode,
    pending_language: Option<String>,
}

fn scan(message: &str) -> Scan {
    let mut segments = Vec::new();
    let mut rest = message;

    loop {
        let fence = rest.find(FENCE);
        let tool = rest.find(TOOL_RESULT_OPEN);

        let (start, is_code) = match (fence, tool) {
            (Some(f), Some(t)) if t < f => (t, false),
            (Some(f), _) => (f, true),
            (None, Some(t)) => (t, false),
            (None, None) => {
                push_text(&mut segments, trim_partial_marker(rest, TOOL_RESULT_OPEN));
                return Scan {
                    segments,
                    mode: FenceMode::Prose,
                    pending_language: None,
                };
            }
        };

        push_text(&mut segments, &rest[..start]);

        if is_code {
            let body = &rest[start + FENCE.len()..];
            let close = body.find(FENCE);
            let newline = body.find('\n');

            match close {
                Some(close) => {
                    let inner = &body[..close];
                    let (language, content) = match newline {
                        Some(newline) if newline < close => {
                            (language_of(&inner[..newline]), &inner[newline + 1..])
                        }
                        _ => (DEFAULT_LANGUAGE.to_string(), inner),
                    };
                    segments.push(Segment::Code {
                        content: content.to_string(),
                        language,
                        streaming: false,
                    });
                    rest = &body[close + FENCE.len()..];
                }
                None => {
                    let body = trim_partial_marker(body, FENCE);
                    let (language, content, pending) = match newline {
                        Some(newline) => (language_of(&body[..newline]), &body[newline + 1..], None),
                        None => (DEFAULT_LANGUAGE.to_string(), "", Some(body.to_string())),
                    };
                    segments.push(Segment::Code {
                        content: content.to_string(),
                        language,
                        streaming: true,
                    });
                    return Scan {
                        segments,
                        mode: FenceMode::Code,
                        pending_language: pending,
                    };
                }
            }
        } else {
            let header = &rest[start + TOOL_RESULT_OPEN.len()..];
            let Some(name_end) = header.find("]]") else {
                segments.push(Segment::ToolResult {
                    name: header.to_string(),
                    content: String::new(),
                    streaming: true,
                });
                return Scan {
                    segments,
                    mode: FenceMode::ToolResult,
                    pending_language: None,
                };
            };
            let name = header[..name_end].to_string();
            let body = &header[name_end + 2..];
            let body = body.strip_prefix('\n').unwrap_or(body);

            match body.find(TOOL_RESULT_CLOSE) {
                Some(close) => {
                    let content = &body[..close];
                    segments.push(Segment::ToolResult {
                        name,
                        content: content.strip_suffix('\n').unwrap_or(content).to_string(),
                        streaming: false,
                    });
                    rest = &body[close + TOOL_RESULT_CLOSE.len()..];
                }
                None => {
                    let content = trim_partial_marker(body, TOOL_RESULT_CLOSE);
                    segments.push(Segment::ToolResult {
                        name,
                        content: content.strip_suffix('\n').unwrap_or(content).to_string(),
                        streaming: true,
                    });
                    return Scan {
                        segments,
                        mode: FenceMode::ToolResult,
                        pending_language: None,
                    };
                }
            }
        }
    }
}

/// Split `message` into ordered segments.
///
/// Text before the first unmatched fence is prose; a fence with a matching
/// close is a finished code block whose language is the info string up to
/// the first newline; a fence without a close is a streaming code block.
/// Tool-result blocks emitted by the pipeline get their own segments and
/// their bodies are never scanned for fences.
pub fn classify(message: &str) -> Vec<Segment> {
    scan(message).segments
}

/// Incremental wrapper over [`classify`] for one assistant message.
#[derive(Debug, Default)]
pub struct FenceParser {
    state: FenceParseState,
}

impl FenceParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `payload` and return the classification of the whole message.
    pub fn push(&mut self, payload: &str) -> Vec<Segment> {
        self.state.accumulated.push_str(payload);
        let scan = scan(&self.state.accumulated);
        self.state.mode = scan.mode;
        self.state.pending_language = scan.pending_language;
        scan.segments
    }

    pub fn segments(&self) -> Vec<Segment> {
        classify(&self.state.accumulated)
    }

    pub fn state(&self) -> &FenceParseState {
        &self.state
    }

    /// Start over for a new assistant message.
    pub fn reset(&mut self) {
        self.state = FenceParseState::default();
    }
}
