//! Receiving side: posts a chat request to the gateway and rebuilds the
//! assistant message from the frame stream.

pub mod session;

pub use session::ChatSession;

use crate::error::{ChatError, StreamError};
use crate::gateway::ChatRequest;
use crate::providers::sanitize_api_error;
use crate::transport::Reassembler;
use futures_util::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome of one streamed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    /// The user aborted; `content` is the partial message.
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ChatClient {
    /// `base_url` is the gateway root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            endpoint: format!("{}/api/chat", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `request` and stream the reply.
    ///
    /// `on_payload` sees every payload appended to the message, in order.
    /// On cancellation the partial message is returned if it is non-empty,
    /// otherwise the request fails with [`ChatError::Cancelled`].
    pub async fn stream_chat<F>(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
        mut on_payload: F,
    ) -> Result<ChatReply, ChatError>
    where
        F: FnMut(&str),
    {
        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ChatError::Cancelled),
            sent = self.http.post(&self.endpoint).json(request).send() => sent,
        };
        let response =
            sent.map_err(|error| StreamError::Transport(sanitize_api_error(&error.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|json| json.get("details").and_then(|d| d.as_str()).map(String::from))
                .unwrap_or(body);
            return Err(StreamError::Rejected {
                status: status.as_u16(),
                message: sanitize_api_error(&message),
            }
            .into());
        }

        let mut bytes = response.bytes_stream();
        let mut reassembler = Reassembler::new();
        let mut cancelled = false;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = bytes.next() => next,
            };
            match next {
                Some(Ok(part)) => {
                    for payload in reassembler.push(&part)? {
                        on_payload(&payload);
                    }
                    if reassembler.is_done() {
                        break;
                    }
                }
                Some(Err(error)) => {
                    return Err(StreamError::Transport(sanitize_api_error(&error.to_string())).into());
                }
                None => break,
            }
        }

        let trailing = if cancelled {
            reassembler.settle()?
        } else {
            reassembler.finish()?
        };
        for payload in trailing {
            on_payload(&payload);
        }

        let content = reassembler.into_message();
        match (cancelled, content.is_empty()) {
            (true, true) => Err(ChatError::Cancelled),
            (true, false) => {
                tracing::debug!(chars = content.len(), "Keeping partial reply after abort");
                Ok(ChatReply {
                    content,
                    cancelled: true,
                })
            }
            (false, true) => Err(StreamError::Empty.into()),
            (false, false) => Ok(ChatReply {
                content,
                cancelled: false,
            }),
        }
    }
}
