use super::traits::RawStream;
use crate::error::ChatError;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

const EVENT_TERMINATORS: [&[u8]; 3] = [b"\n\n", b"\r\n\r\n", b"\r\r"];

/// Splits an upstream `text/event-stream` body into event blocks.
///
/// Bytes are buffered undecoded so multi-byte characters split across
/// network reads survive.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete event. Events end in a blank line, written as `\n\n`,
    /// `\r\n\r\n` or `\r\r`.
    pub fn next_event_block(&mut self) -> Option<String> {
        let end = EVENT_TERMINATORS
            .iter()
            .filter_map(|terminator| {
                self.buffer
                    .windows(terminator.len())
                    .position(|window| window == *terminator)
                    .map(|start| (start, start + terminator.len()))
            })
            .min()
            .map(|(_, end)| end)?;
        let block: Vec<u8> = self.buffer.drain(..end).collect();
        Some(
            String::from_utf8_lossy(&block)
                .replace("\r\n", "\n")
                .replace('\r', "\n"),
        )
    }

    /// Whatever trails the last complete event, at end of stream.
    pub fn take_remainder(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = String::from_utf8_lossy(&rest).trim().to_string();
        (!rest.is_empty()).then_some(rest)
    }
}

/// Payloads of the `data:` lines in one event block. The space after the
/// colon is optional on the wire.
pub fn parse_data_lines(event_block: &str) -> Vec<&str> {
    event_block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect()
}

/// Turn an event-stream response into raw text fragments.
///
/// `parse` maps one `data:` payload to a fragment, an in-band error, or
/// nothing. The stream stops at the first transport error or when `cancel`
/// fires.
pub fn event_stream<F>(response: reqwest::Response, cancel: CancellationToken, parse: F) -> RawStream
where
    F: Fn(&str) -> Option<Result<String, ChatError>> + Send + 'static,
{
    let mut byte_stream = response.bytes_stream();

    let stream = async_stream::stream! {
        let mut sse_buffer = SseBuffer::new();
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = byte_stream.next() => next,
            };
            match next {
                None => break,
                Some(Ok(bytes)) => sse_buffer.push_chunk(&bytes),
                Some(Err(error)) => {
                    yield Err(ChatError::from(error));
                    break;
                }
            }

            while let Some(block) = sse_buffer.next_event_block() {
                for data in parse_data_lines(&block) {
                    if let Some(item) = parse(data) {
                        yield item;
                    }
                }
            }
        }

        let remainder = if cancel.is_cancelled() {
            None
        } else {
            sse_buffer.take_remainder()
        };
        if let Some(rest) = remainder {
            for data in parse_data_lines(&rest) {
                if let Some(item) = parse(data) {
                    yield item;
                }
            }
        }
    };

    Box::pin(stream)
}
