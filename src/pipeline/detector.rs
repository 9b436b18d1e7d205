use super::chunk::Chunk;
use super::repair::{ToolCall, object_end, parse_tool_call};
use crate::observability::{Observer, ObserverEvent, record};
use crate::tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Literal marker that introduces an in-band tool directive.
pub const DIRECTIVE_MARKER: &str = "TOOL_CALL:";

/// Upper bound on text held back while waiting for a directive to close.
pub const DEFAULT_SCAN_WINDOW: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Normal,
    Dispatching,
}

/// Length of the longest suffix of `text` that is a proper prefix of the
/// directive marker.
fn partial_marker_len(text: &str) -> usize {
    (1..DIRECTIVE_MARKER.len())
        .rev()
        .find(|&len| {
            text.len() >= len
                && text.is_char_boundary(text.len() - len)
                && DIRECTIVE_MARKER.starts_with(&text[text.len() - len..])
        })
        .unwrap_or(0)
}

/// Recognises `TOOL_CALL: {...}` directives in buffered text, runs the named
/// tool, and splices its result into the chunk stream.
///
/// Detection works on the accumulated text, not on chunk boundaries. Text
/// that cannot be part of a directive is forwarded immediately; an unclosed
/// directive is held for at most `window` bytes before it is released as
/// prose.
pub struct ToolCallDetector {
    registry: Arc<ToolRegistry>,
    observer: Arc<dyn Observer>,
    scan: String,
    window: usize,
    state: DetectorState,
}

enum Step {
    Emit(Chunk),
    Dispatch(ToolCall),
    Wait,
}

impl ToolCallDetector {
    pub fn new(registry: Arc<ToolRegistry>, observer: Arc<dyn Observer>, window: usize) -> Self {
        Self {
            registry,
            observer,
            scan: String::new(),
            window: window.max(DIRECTIVE_MARKER.len() + 2),
            state: DetectorState::Normal,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub async fn push(&mut self, chunk: Chunk) -> Vec<Chunk> {
        if chunk.is_tool_result() {
            let mut out = self.drain(true).await;
            out.push(chunk);
            return out;
        }
        self.scan.push_str(&chunk.text);
        self.drain(false).await
    }

    /// Release everything still buffered at end of stream.
    pub async fn finish(&mut self) -> Vec<Chunk> {
        self.drain(true).await
    }

    async fn drain(&mut self, at_end: bool) -> Vec<Chunk> {
        let mut out = Vec::new();
        loop {
            match self.next_step(at_end) {
                Step::Emit(chunk) => out.push(chunk),
                Step::Dispatch(call) => out.extend(self.dispatch(call).await),
                Step::Wait => break,
            }
        }
        out
    }

    fn take_text(&mut self, len: usize) -> Step {
        let text: String = self.scan.drain(..len).collect();
        Step::Emit(Chunk::text(text))
    }

    fn next_step(&mut self, at_end: bool) -> Step {
        if self.scan.is_empty() {
            return Step::Wait;
        }

        let Some(start) = self.scan.find(DIRECTIVE_MARKER) else {
            let hold = if at_end { 0 } else { partial_marker_len(&self.scan) };
            let ready = self.scan.len() - hold;
            return if ready == 0 { Step::Wait } else { self.take_text(ready) };
        };

        if start > 0 {
            return self.take_text(start);
        }

        let after_marker = &self.scan[DIRECTIVE_MARKER.len()..];
        let payload = after_marker.trim_start();
        let payload_start = self.scan.len() - payload.len();

        if payload.is_empty() {
            return if at_end {
                self.take_text(self.scan.len())
            } else {
                Step::Wait
            };
        }

        if !payload.starts_with('{') {
            return self.take_text(DIRECTIVE_MARKER.len());
        }

        if let Some(end) = object_end(payload) {
            let consumed = payload_start + end;
            return match parse_tool_call(&payload[..end]) {
                Some(call) => {
                    self.scan.drain(..consumed);
                    Step::Dispatch(call)
                }
                None => {
                    tracing::debug!("Tool directive payload did not parse; forwarding as text");
                    self.take_text(consumed)
                }
            };
        }

        if at_end {
            if let Some(call) = parse_tool_call(payload) {
                self.scan.clear();
                return Step::Dispatch(call);
            }
            return self.take_text(self.scan.len());
        }

        if self.scan.len() > self.window {
            tracing::debug!(
                held = self.scan.len(),
                "Unclosed tool directive exceeded scan window; forwarding as text"
            );
            return self.take_text(self.scan.len());
        }

        Step::Wait
    }

    async fn dispatch(&mut self, call: ToolCall) -> Vec<Chunk> {
        self.state = DetectorState::Dispatching;

        let Some(tool) = self.registry.get(&call.name).cloned() else {
            tracing::warn!(tool = %call.name, "Dropping directive for unregistered tool");
            self.state = DetectorState::Normal;
            return Vec::new();
        };

        tracing::info!(tool = %call.name, "Dispatching in-band tool call");
        let started = Instant::now();
        let output = tool.call(Value::Object(call.arguments)).await;

        record(
            self.observer.as_ref(),
            &ObserverEvent::ToolCall {
                tool: call.name.clone(),
                duration: started.elapsed(),
                success: output.success,
            },
        );

        self.state = DetectorState::Normal;
        vec![Chunk::tool_result(&call.name, &output.render())]
    }
}
