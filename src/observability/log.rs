use super::traits::{Observer, ObserverEvent};
use tracing::{debug, info, warn};

/// Log-based observer: uses tracing, zero external deps
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new()
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) -> anyhow::Result<()> {
        match event {
            ObserverEvent::ChatStart { model, tools } => {
                info!(model = %model, tools = tools, "chat.start");
            }
            ObserverEvent::ChunkAccepted { chunk } => {
                debug!(
                    kind = ?chunk.kind,
                    chars = chunk.text.chars().count(),
                    last = chunk.last,
                    "chat.chunk"
                );
            }
            ObserverEvent::ToolCall {
                tool,
                duration,
                success,
            } => {
                info!(tool = %tool, duration_ms = millis(*duration), success = success, "tool.call");
            }
            ObserverEvent::ChatEnd {
                duration,
                chunks,
                cancelled,
            } => {
                info!(
                    duration_ms = millis(*duration),
                    chunks = chunks,
                    cancelled = cancelled,
                    "chat.end"
                );
            }
            ObserverEvent::Error { component, message } => {
                warn!(component = %component, error = %message, "error");
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
