use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_true")]
    pub web_search: bool,
    #[serde(default = "default_true")]
    pub url_fetch: bool,
    /// Characters of page text kept by `url_fetch` (default: 2000)
    #[serde(default = "default_fetch_max_chars")]
    pub fetch_max_chars: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// HTML results endpoint queried by `web_search`
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,
}

fn default_true() -> bool {
    true
}

fn default_fetch_max_chars() -> usize {
    2000
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_search_endpoint() -> String {
    "https://html.duckduckgo.com/html/".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            web_search: true,
            url_fetch: true,
            fetch_max_chars: default_fetch_max_chars(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            search_endpoint: default_search_endpoint(),
        }
    }
}
