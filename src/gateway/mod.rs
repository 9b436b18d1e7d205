//! Axum HTTP gateway: `/api/chat` streams chunk frames, `/api/models` lists
//! the catalog, `/health` reports liveness.
//!
//! - Request body size limit from `[gateway] max_body_bytes`
//! - Permissive CORS so browser front-ends on another origin can connect
//! - One cancellation token per chat request, fired when the client drops
//!   the response body

mod handlers;
mod streaming;

pub use handlers::{ChatRequest, error_status};
pub use streaming::build_sse_response;

use handlers::{handle_chat, handle_health, handle_models};

use crate::catalog::{AgentProfileStore, JsonFileProfileStore, ModelCatalog, StaticCatalog};
use crate::config::Config;
use crate::observability::{self, Observer};
use crate::providers::{self, ChatModel};
use crate::tools::{self, ToolRegistry};
use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn ModelCatalog>,
    /// `None` when the provider could not be built (missing credentials);
    /// chat requests then fail with a configuration error.
    pub model: Option<Arc<dyn ChatModel>>,
    pub tools: Arc<ToolRegistry>,
    pub profiles: Option<Arc<dyn AgentProfileStore>>,
    pub observer: Arc<dyn Observer>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let model = match providers::create_chat_model(&config) {
            Ok(model) => Some(model),
            Err(error) => {
                tracing::warn!(%error, "Chat model unavailable; /api/chat will fail until configured");
                None
            }
        };
        let tools = Arc::new(tools::default_tools(&config.tools)?);
        let profiles = config
            .agent_profile_path()
            .map(|path| Arc::new(JsonFileProfileStore::new(path)) as Arc<dyn AgentProfileStore>);
        let observer = observability::create_observer(&config.observability);
        let catalog: Arc<dyn ModelCatalog> = Arc::new(StaticCatalog::new(config.models.clone()));

        Ok(Self {
            config: Arc::new(config),
            catalog,
            model,
            tools,
            profiles,
            observer,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let max_body = state.config.gateway.max_body_bytes;
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/models", get(handle_models))
        .route("/api/chat", post(handle_chat))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(CorsLayer::permissive())
}

/// Run the HTTP gateway on the configured host and port.
pub async fn run_gateway(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.gateway.host, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_gateway_with_listener(listener, config).await
}

/// Run the HTTP gateway from a pre-bound listener.
pub async fn run_gateway_with_listener(
    listener: tokio::net::TcpListener,
    config: Config,
) -> Result<()> {
    let addr = listener.local_addr()?;
    let state = AppState::from_config(config)?;

    tracing::info!(
        %addr,
        provider = %state.config.provider,
        models = state.catalog.list().len(),
        tools = ?state.tools.tool_names(),
        "Gateway listening"
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}
