mod core;
mod gateway;
mod models;
mod observability;
mod pipeline;
mod tools;

pub use core::{Config, ProviderKind};
pub use gateway::GatewayConfig;
pub use models::{ModelEntry, default_models};
pub use observability::ObservabilityConfig;
pub use pipeline::PipelineConfig;
pub use tools::ToolsConfig;
