use crate::pipeline::{DEFAULT_CHUNK_THRESHOLD, DEFAULT_SCAN_WINDOW};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Prior turns included in the prompt, system excluded (default: 4)
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Sentence buffer size that forces a chunk out (default: 30 chars)
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: usize,
    /// Longest unclosed tool directive held back (default: 2048 bytes)
    #[serde(default = "default_tool_scan_window")]
    pub tool_scan_window: usize,
    /// Upstream request timeout in seconds (default: 120)
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
}

fn default_history_window() -> usize {
    4
}

fn default_chunk_threshold() -> usize {
    DEFAULT_CHUNK_THRESHOLD
}

fn default_tool_scan_window() -> usize {
    DEFAULT_SCAN_WINDOW
}

fn default_upstream_timeout_secs() -> u64 {
    120
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            chunk_threshold: default_chunk_threshold(),
            tool_scan_window: default_tool_scan_window(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}
