use super::traits::{Tool, parse_args};
use crate::config::ToolsConfig;
use anyhow::{Context, bail};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

const MAX_RESULTS: usize = 10;

fn default_max_results() -> usize {
    3
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_max_results", alias = "maxResults")]
    max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub summary: String,
    pub url: String,
}

/// Web search over a DuckDuckGo-style HTML results page.
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: Url,
}

impl WebSearchTool {
    pub fn new(config: &ToolsConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.search_endpoint)
            .with_context(|| format!("invalid search endpoint {}", config.search_endpoint))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; streamchat/0.1)")
            .build()?;
        Ok(Self { client, endpoint })
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Result links on the HTML endpoint are redirect URLs carrying the target in
/// the `uddg` query parameter.
fn resolve_result_url(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, target)| target.into_owned())
        })
        .unwrap_or(absolute)
}

pub fn parse_results(html: &str, limit: usize) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let href = link.value().attr("href")?;
            Some(SearchHit {
                title: element_text(link),
                summary: result
                    .select(&snippet_sel)
                    .next()
                    .map(element_text)
                    .unwrap_or_default(),
                url: resolve_result_url(href),
            })
        })
        .take(limit)
        .collect()
}

pub fn format_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }

    let mut lines = vec![
        "Search Results:".to_string(),
        "I found the following results. Fetch any that look relevant with url_fetch.".to_string(),
        String::new(),
    ];
    for (index, hit) in hits.iter().enumerate() {
        lines.push(format!("[Result {}]", index + 1));
        lines.push(format!("Title: {}", hit.title));
        lines.push(format!("Summary: {}", hit.summary));
        lines.push(format!("URL: {}", hit.url));
        lines.push(String::new());
    }
    lines.push("Next Steps:".to_string());
    lines.push("1. Review these results to identify the most relevant URLs".to_string());
    lines.push("2. Use the url_fetch tool to get detailed content from promising URLs".to_string());
    lines.join("\n")
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns titles, summaries and URLs you can pass to url_fetch."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "minLength": 1},
                "max_results": {"type": "integer", "minimum": 1, "maximum": MAX_RESULTS, "default": 3}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let args: SearchArgs = parse_args(self.name(), args)?;
        let query = args.query.trim();
        if query.is_empty() {
            bail!("query must not be empty");
        }
        if !(1..=MAX_RESULTS).contains(&args.max_results) {
            bail!("max_results must be between 1 and {MAX_RESULTS}");
        }

        tracing::debug!(query = %query, "Running web search");
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query)])
            .send()
            .await
            .context("Failed to search")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Failed to search: search endpoint returned {status}");
        }

        let body = response.text().await.context("Failed to read search results")?;
        Ok(format_results(&parse_results(&body, args.max_results)))
    }
}
