use super::{ToolRegistry, UrlFetchTool, WebSearchTool};
use crate::config::ToolsConfig;
use std::sync::Arc;

/// Build the registry of capabilities enabled in config.
pub fn default_tools(config: &ToolsConfig) -> anyhow::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    if config.web_search {
        registry.register(Arc::new(WebSearchTool::new(config)?));
    }
    if config.url_fetch {
        registry.register(Arc::new(UrlFetchTool::new(config)?));
    }
    Ok(registry)
}
