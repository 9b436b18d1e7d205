use super::types::{ToolOutput, ToolSpec};
use crate::error::ChatError;
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Core tool trait: implement for any capability
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (used in the directive payload)
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// JSON schema for parameters
    fn parameters_schema(&self) -> Value;

    /// Run the capability. Failures may propagate; [`Tool::call`] contains them.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;

    /// Get the full spec for prompt registration
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    /// Invoke the capability; never fails past this boundary.
    async fn call(&self, args: Value) -> ToolOutput {
        match self.execute(args).await {
            Ok(output) => ToolOutput::ok(output),
            Err(error) => {
                let error = ChatError::ToolExecution {
                    tool: self.name().to_string(),
                    message: format!("{error:#}"),
                };
                tracing::warn!(tool = self.name(), "{error}");
                ToolOutput::failed(error.to_string())
            }
        }
    }
}

/// Deserialize directive arguments into a typed parameter struct.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> anyhow::Result<T> {
    serde_json::from_value(args).with_context(|| format!("invalid arguments for {tool}"))
}
