use crate::pipeline::Chunk;
use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    ChatStart {
        model: String,
        tools: usize,
    },
    /// Every chunk the adapter accepts for transport.
    ChunkAccepted {
        chunk: Chunk,
    },
    ToolCall {
        tool: String,
        duration: Duration,
        success: bool,
    },
    ChatEnd {
        duration: Duration,
        chunks: usize,
        cancelled: bool,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Core observability trait: implement for any backend.
///
/// A failing observer never aborts generation: callers go through
/// [`record`], which logs the failure and carries on.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ObserverEvent) -> anyhow::Result<()>;

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}

/// Forward an event, swallowing observer failures.
pub fn record(observer: &dyn Observer, event: &ObserverEvent) {
    if let Err(error) = observer.record_event(event) {
        tracing::warn!(observer = observer.name(), "observer failed: {error}");
    }
}
