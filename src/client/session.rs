use super::{ChatClient, ChatReply};
use crate::error::ChatError;
use crate::gateway::ChatRequest;
use crate::providers::{Message, Role};
use tokio_util::sync::CancellationToken;

/// Client-held conversation; history is sent with each request.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: ChatClient,
    model_id: Option<String>,
    tools_enabled: bool,
    history: Vec<Message>,
}

impl ChatSession {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            model_id: None,
            tools_enabled: false,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    #[must_use]
    pub fn with_tools(mut self, enabled: bool) -> Self {
        self.tools_enabled = enabled;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    pub fn set_model(&mut self, model_id: impl Into<String>) {
        self.model_id = Some(model_id.into());
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Ask `message`. The user turn is kept even when the request fails so
    /// it can be regenerated; the assistant turn is kept on success and on
    /// an abort that produced content.
    pub async fn submit<F>(
        &mut self,
        message: &str,
        cancel: CancellationToken,
        on_payload: F,
    ) -> Result<ChatReply, ChatError>
    where
        F: FnMut(&str),
    {
        let request = ChatRequest {
            message: message.to_string(),
            chat_history: self.history.clone(),
            model_id: self.model_id.clone(),
            tools_enabled: self.tools_enabled,
        };
        self.history.push(Message::user(message));

        let reply = self.client.stream_chat(&request, cancel, on_payload).await?;
        self.history.push(Message::assistant(reply.content.clone()));
        Ok(reply)
    }

    /// Drop a trailing assistant turn and ask the last user message again.
    pub async fn regenerate<F>(
        &mut self,
        cancel: CancellationToken,
        on_payload: F,
    ) -> Result<ChatReply, ChatError>
    where
        F: FnMut(&str),
    {
        if self.history.last().is_some_and(|m| m.role == Role::Assistant) {
            self.history.pop();
        }
        let message = match self.history.pop() {
            Some(last) if last.role == Role::User => last.content,
            Some(other) => {
                self.history.push(other);
                return Err(ChatError::validation("no user message to regenerate"));
            }
            None => return Err(ChatError::validation("no user message to regenerate")),
        };
        self.submit(&message, cancel, on_payload).await
    }
}
