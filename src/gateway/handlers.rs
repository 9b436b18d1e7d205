use super::AppState;
use super::streaming::build_sse_response;
use crate::catalog::{ModelCatalog, ModelSummary};
use crate::error::{ChatError, ConfigurationError};
use crate::pipeline::{ChatAdapter, ChunkStream};
use crate::providers::{Conversation, Message};
use crate::tools::ToolRegistry;
use crate::transport;
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Chat request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "chat_history")]
    pub chat_history: Vec<Message>,
    #[serde(default, alias = "model_id")]
    pub model_id: Option<String>,
    #[serde(default, alias = "tools_enabled")]
    pub tools_enabled: bool,
}

/// HTTP status for a failure that aborts before streaming.
pub fn error_status(error: &ChatError) -> StatusCode {
    match error {
        ChatError::RequestValidation(_) => StatusCode::BAD_REQUEST,
        ChatError::Configuration(ConfigurationError::ModelNotFound(_)) => StatusCode::NOT_FOUND,
        ChatError::Configuration(ConfigurationError::ModelInactive(_)) => StatusCode::CONFLICT,
        ChatError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &ChatError) -> Response {
    let status = error_status(error);
    let reported = match error {
        ChatError::Upstream {
            status: Some(upstream),
            ..
        } => *upstream,
        _ => status.as_u16(),
    };
    let body = serde_json::json!({
        "error": error.kind(),
        "details": error.to_string(),
        "status": reported,
    });
    (status, Json(body)).into_response()
}

/// GET /health
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "provider": state.config.provider.to_string(),
        "model_ready": state.model.is_some(),
    }))
}

/// GET /api/models
pub(super) async fn handle_models(State(state): State<AppState>) -> impl IntoResponse {
    let models: Vec<ModelSummary> = state.catalog.list().iter().map(ModelSummary::from).collect();
    Json(models)
}

fn system_message(state: &AppState) -> String {
    let system = state.config.system_prompt.clone();
    let Some(store) = &state.profiles else {
        return system;
    };
    match store.load() {
        Ok(Some(profile)) => profile.apply_to(&system),
        Ok(None) => system,
        Err(error) => {
            tracing::warn!(%error, "Ignoring unreadable agent profile");
            system
        }
    }
}

/// Everything up to the first stream item. Any error here becomes a plain
/// JSON response instead of a stream.
async fn open_stream(
    state: &AppState,
    request: ChatRequest,
    cancel: CancellationToken,
) -> Result<ChunkStream, ChatError> {
    if request.message.trim().is_empty() {
        return Err(ChatError::validation("message must not be empty"));
    }

    let model_id = request
        .model_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| state.catalog.default_model_id())
        .unwrap_or_default();
    let entry = state.catalog.resolve_active(&model_id)?;

    let model = state.model.clone().ok_or_else(|| ConfigurationError::MissingCredentials {
        provider: state.config.provider.to_string(),
    })?;

    let tools = if request.tools_enabled && entry.supports_tool_call {
        Arc::clone(&state.tools)
    } else {
        if request.tools_enabled {
            tracing::debug!(model = %entry.id, "Model does not support tool calls; tools disabled");
        }
        Arc::new(ToolRegistry::new())
    };

    let conversation = Conversation::new(
        Some(system_message(state)),
        request.chat_history,
        request.message,
    );

    let adapter = ChatAdapter::new(model, &entry, &state.config.pipeline)
        .with_observer(Arc::clone(&state.observer));
    let mut stream = adapter.generate(&conversation, tools, cancel).await?;

    match stream.next().await {
        Some(Err(error)) if !error.is_cancellation() => Err(error),
        Some(first) => Ok(Box::pin(futures_util::stream::iter([first]).chain(stream))),
        None => Ok(stream),
    }
}

/// POST /api/chat
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, %rejection, "Rejected malformed chat request");
            return error_response(&ChatError::validation(rejection.body_text()));
        }
    };

    let cancel = CancellationToken::new();
    match open_stream(&state, request, cancel.clone()).await {
        Ok(chunks) => {
            tracing::info!(request_id = %request_id, "Streaming chat response");
            let frames = transport::encode(chunks, cancel.clone());
            build_sse_response(frames, cancel.drop_guard(), &request_id)
        }
        Err(error) => {
            tracing::warn!(request_id = %request_id, kind = error.kind(), %error, "Chat request failed before streaming");
            error_response(&error)
        }
    }
}
