pub mod schema;

pub use schema::{
    Config, GatewayConfig, ModelEntry, ObservabilityConfig, PipelineConfig, ProviderKind,
    ToolsConfig,
};
