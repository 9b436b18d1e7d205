use super::traits::{Tool, parse_args};
use crate::config::ToolsConfig;
use anyhow::{Context, bail};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

const SKIPPED_TAGS: [&str; 9] = [
    "script", "style", "noscript", "iframe", "img", "svg", "nav", "footer", "header",
];
const SKIPPED_ROLES: [&str; 3] = ["banner", "navigation", "complementary"];
const FALLBACK_SELECTORS: [&str; 5] = ["article", ".content", "#content", ".main", "#main"];
const TRUNCATION_NOTE: &str = "[Content truncated...]";

fn default_selector() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
struct FetchArgs {
    url: String,
    #[serde(default = "default_selector")]
    selector: String,
}

/// Fetch a page and extract the readable text of one region.
pub struct UrlFetchTool {
    client: reqwest::Client,
    max_chars: usize,
}

impl UrlFetchTool {
    pub fn new(config: &ToolsConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; streamchat/0.1)")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            max_chars: config.fetch_max_chars,
        })
    }
}

fn is_skipped(element: ElementRef<'_>) -> bool {
    let value = element.value();
    SKIPPED_TAGS.contains(&value.name())
        || value
            .attr("role")
            .is_some_and(|role| SKIPPED_ROLES.contains(&role))
}

fn collect_visible(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child) = ElementRef::wrap(child)
            && !is_skipped(child)
        {
            collect_visible(child, out);
        }
    }
}

/// Visible text of every element matching `selector`, whitespace collapsed.
fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let mut raw = String::new();
    for element in document.select(&selector) {
        if is_skipped(element) {
            continue;
        }
        collect_visible(element, &mut raw);
        raw.push('\n');
    }
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => (&text[..index], true),
        None => (text, false),
    }
}

/// Render the extracted region of `html` as a tool result block.
pub fn extract_page(url: &str, html: &str, selector: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);
    let title = select_text(&document, "title").unwrap_or_default();

    let (used, content) = match select_text(&document, selector) {
        Some(content) => (None, content),
        None => {
            let Some((fallback, content)) = FALLBACK_SELECTORS
                .iter()
                .find_map(|candidate| select_text(&document, candidate).map(|c| (*candidate, c)))
            else {
                return format!(
                    "No content found at {url} with selector \"{selector}\" or common alternative selectors."
                );
            };
            (Some(fallback), content)
        }
    };

    let (body, truncated) = truncate_chars(&content, max_chars);
    let mut lines = vec![format!("URL: {url}"), format!("Title: {title}")];
    match used {
        Some(fallback) => lines.push(format!(
            "Note: No content found with selector \"{selector}\", using \"{fallback}\" instead."
        )),
        None => lines.push(format!("Selector: {selector}")),
    }
    lines.push("Content:".to_string());
    lines.push(body.to_string());
    if truncated {
        lines.push(String::new());
        lines.push(TRUNCATION_NOTE.to_string());
    }
    lines.join("\n")
}

#[async_trait]
impl Tool for UrlFetchTool {
    fn name(&self) -> &str {
        "url_fetch"
    }

    fn description(&self) -> &str {
        "Fetch and extract content from a specific URL. Defaults to the main content area; other common selectors are 'article' and '.content'."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "format": "uri"},
                "selector": {"type": "string", "default": "main"}
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let args: FetchArgs = parse_args(self.name(), args)?;
        let url = Url::parse(&args.url).with_context(|| format!("invalid url: {}", args.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("unsupported url scheme: {}", url.scheme());
        }

        tracing::debug!(url = %url, selector = %args.selector, "Fetching page");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .context("Failed to fetch content")?;

        let status = response.status();
        if !status.is_success() {
            bail!("Failed to fetch URL: {status}");
        }

        let body = response.text().await.context("Failed to read page body")?;
        Ok(extract_page(url.as_str(), &body, &args.selector, self.max_chars))
    }
}
