use async_trait::async_trait;
use futures_util::StreamExt;
use streamchat::ChatError;
use streamchat::providers::{ChatModel, GenerationParams, RawStream};
use tokio_util::sync::CancellationToken;

/// Replays fixed raw fragments, then either ends or hangs.
pub struct ScriptedModel {
    pub fragments: Vec<String>,
    /// Never end after the script, like an upstream still generating.
    pub hang: bool,
}

impl ScriptedModel {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(ToString::to_string).collect(),
            hang: false,
        }
    }

    pub fn hanging(fragments: &[&str]) -> Self {
        Self {
            hang: true,
            ..Self::new(fragments)
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_raw(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
        _cancel: CancellationToken,
    ) -> Result<RawStream, ChatError> {
        let script = futures_util::stream::iter(self.fragments.clone().into_iter().map(Ok));
        if self.hang {
            Ok(Box::pin(script.chain(futures_util::stream::pending())))
        } else {
            Ok(Box::pin(script))
        }
    }

    async fn complete(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, ChatError> {
        Ok(self.fragments.concat())
    }
}
