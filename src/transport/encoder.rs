use crate::pipeline::{Chunk, ChunkStream};
use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

pub const FRAME_PREFIX: &str = "data: ";
pub const FRAME_TERMINATOR: &str = "\n\n";
pub const DONE_SENTINEL: &str = "[DONE]";
pub const ERROR_PREFIX: &str = "Error:";

/// Wire form of one payload.
pub fn frame(payload: &str) -> String {
    format!("{FRAME_PREFIX}{payload}{FRAME_TERMINATOR}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    Open,
    /// The error frame went out; only the terminal frame may follow.
    Errored,
    Closed,
}

/// Enforces `Open -> frame* -> error? -> DONE -> Closed`.
#[derive(Debug)]
pub struct FrameEncoder {
    state: EncoderState,
    frames: usize,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self {
            state: EncoderState::Open,
            frames: 0,
        }
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Content frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn chunk(&mut self, chunk: &Chunk) -> Option<String> {
        if self.state != EncoderState::Open || chunk.text.is_empty() {
            return None;
        }
        self.frames += 1;
        Some(frame(&chunk.text))
    }

    pub fn error(&mut self, message: &str) -> Option<String> {
        if self.state != EncoderState::Open {
            return None;
        }
        self.state = EncoderState::Errored;
        Some(frame(&format!("{ERROR_PREFIX} {message}")))
    }

    pub fn done(&mut self) -> Option<String> {
        if self.state == EncoderState::Closed {
            return None;
        }
        self.state = EncoderState::Closed;
        Some(frame(DONE_SENTINEL))
    }
}

/// Frame a chunk stream for the wire.
///
/// Always ends with the terminal frame. A failure from the source becomes an
/// in-band error frame; cancellation stops content frames and goes straight
/// to the terminal frame.
pub fn encode(chunks: ChunkStream, cancel: CancellationToken) -> impl Stream<Item = String> + Send {
    async_stream::stream! {
        let mut encoder = FrameEncoder::new();
        let mut chunks = chunks;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = chunks.next() => next,
            };
            match next {
                None => break,
                Some(Ok(chunk)) => {
                    if let Some(frame) = encoder.chunk(&chunk) {
                        yield frame;
                    }
                }
                Some(Err(error)) => {
                    if !error.is_cancellation() {
                        tracing::warn!(frames = encoder.frames(), "Stream failed mid-response: {error}");
                        if let Some(frame) = encoder.error(&error.to_string()) {
                            yield frame;
                        }
                    }
                    break;
                }
            }
        }

        if cancel.is_cancelled() {
            tracing::debug!(frames = encoder.frames(), "Stream cancelled by client");
        }
        if let Some(frame) = encoder.done() {
            yield frame;
        }
    }
}
