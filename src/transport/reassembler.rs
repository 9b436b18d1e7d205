use super::encoder::{DONE_SENTINEL, ERROR_PREFIX, FRAME_PREFIX, FRAME_TERMINATOR};
use crate::error::StreamError;

const MARKER: &[u8] = FRAME_PREFIX.as_bytes();
const BOUNDARY: &[u8] = b"\n\ndata: ";

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

/// Rebuilds frame payloads from arbitrarily fragmented transport bytes and
/// keeps the running assistant message.
///
/// A frame starts at `data: ` (at the start of the stream or right after a
/// blank line) and is complete once the next frame start or end of stream
/// is seen.
#[derive(Debug, Default)]
pub struct Reassembler {
    buffer: Vec<u8>,
    message: String,
    done: bool,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read. Returns the payloads appended to the message by it.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, StreamError> {
        if self.done {
            return Ok(Vec::new());
        }
        self.buffer.extend_from_slice(bytes);
        self.drain(false)
    }

    /// End of stream: the trailing frame, if any, is complete.
    pub fn finish(&mut self) -> Result<Vec<String>, StreamError> {
        if self.done {
            return Ok(Vec::new());
        }
        self.drain(true)
    }

    /// The stream stopped early. A trailing frame is delivered only if its
    /// terminator arrived; a frame cut off mid-way is discarded.
    pub fn settle(&mut self) -> Result<Vec<String>, StreamError> {
        if self.done {
            return Ok(Vec::new());
        }
        let terminated = self.buffer.starts_with(MARKER)
            && self.buffer.len() >= MARKER.len() + FRAME_TERMINATOR.len()
            && self.buffer.ends_with(FRAME_TERMINATOR.as_bytes());
        let appended = self.drain(terminated)?;
        self.buffer.clear();
        Ok(appended)
    }

    /// Whether the terminal frame was seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }

    fn drain(&mut self, at_end: bool) -> Result<Vec<String>, StreamError> {
        let mut appended = Vec::new();

        while !self.done {
            if !self.buffer.starts_with(MARKER) {
                match find(&self.buffer, MARKER, 0) {
                    Some(start) => {
                        tracing::debug!(skipped = start, "Discarding bytes before frame start");
                        self.buffer.drain(..start);
                    }
                    None => break,
                }
            }

            let frame_end = match find(&self.buffer, BOUNDARY, MARKER.len()) {
                Some(boundary) => boundary + FRAME_TERMINATOR.len(),
                None if at_end => self.buffer.len(),
                None => break,
            };

            let frame: Vec<u8> = self.buffer.drain(..frame_end).collect();
            let body = &frame[MARKER.len()..];
            let body = body
                .strip_suffix(FRAME_TERMINATOR.as_bytes())
                .unwrap_or(body);
            let payload = String::from_utf8_lossy(body).into_owned();

            if payload == DONE_SENTINEL {
                self.done = true;
                self.buffer.clear();
                break;
            }
            if let Some(error) = payload.strip_prefix(ERROR_PREFIX) {
                self.done = true;
                self.buffer.clear();
                return Err(StreamError::Server(error.trim().to_string()));
            }

            self.message.push_str(&payload);
            appended.push(payload);
        }

        if at_end {
            self.buffer.clear();
        }
        Ok(appended)
    }
}
